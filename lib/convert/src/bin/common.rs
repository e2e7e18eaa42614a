use std::fmt::Display;
use std::str::FromStr;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Clone, Debug, StructOpt)]
pub struct OutputOptions {
  /// Output directory [default: test_data/<dialect output dir>]
  #[structopt(long="output-dir", short="o")]
  pub dir: Option<PathBuf>,
  /// Prepended to every output file name
  #[structopt(long, default_value="")]
  pub prefix: String,
  /// Additional JSON log file
  #[structopt(long)]
  pub log: Option<PathBuf>,
  /// Write a JSON batch report
  #[structopt(long)]
  pub report: Option<PathBuf>,
}

pub fn clap_range_validator<T>(minval: Option<T>, maxval: Option<T>) -> impl Fn(String) -> Result<(), String>
    where
        T: FromStr + PartialOrd + Display + Copy,
        T::Err: Display
{
    return move |val| {
        let x: T = val.parse().map_err(|e: T::Err| e.to_string())?;
        if let Some(y) = minval {
            if x < y { return Err(format!("must be at least {}", y)); }
        }
        if let Some(y) = maxval {
            if x > y { return Err(format!("must be at most {}", y)); }
        }
        return Ok(());
    };
}
