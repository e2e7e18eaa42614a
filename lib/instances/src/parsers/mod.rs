mod common;

mod legacy;
pub use legacy::{FolderFmt, TableKind};

mod solomon;
pub use solomon::{SolomonFmt, SolomonStr};


mod nom_prelude {
  pub use nom::{
    IResult, Parser,
    error::{
      self,
      ParseError,
      FromExternalError,
    },
    sequence::*,
    combinator::*,
    character::complete::*,
    bytes::complete::take_while_m_n,
    Finish,
  };
  pub use std::str::FromStr;
  pub use std::num::{ParseIntError, ParseFloatError};
}

pub trait ParseInstance<Fmt>: Sized {
  fn parse(inputs: Fmt) -> crate::Result<Self>;
}
