use super::{
	localpart::{InvalidLocalPart, LocalPart},
	Domain, ParseDomainError,
};
use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};
use thiserror::Error;

/// A mailbox in angle brackets, as it appears in `MAIL FROM:` and `RCPT TO:`.
/// Any source route is checked and then dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
	pub local_part: LocalPart,
	pub domain: Domain,
}

impl Path {
	/// `local@domain`, with the domain lower-cased and the local part left alone.
	pub fn mailbox(&self) -> String {
		format!("{}@{}", self.local_part, self.domain.normalized())
	}

	fn parse_naked_path(naked: &str) -> Result<Self, ParsePathError> {
		if let Some((local_part, domain)) = naked.rsplit_once('@') {
			Ok(Self {
				local_part: local_part.parse()?,
				domain: domain.parse()?,
			})
		} else {
			Err(ParsePathError::NoAtSign)
		}
	}
}

impl Display for Path {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "<{}@{}>", self.local_part, self.domain)
	}
}

impl FromStr for Path {
	type Err = ParsePathError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let stripped = s
			.strip_prefix('<')
			.and_then(|path| path.strip_suffix('>'))
			.ok_or(ParsePathError::Brackets)?;

		// ADLs have to start with @
		match stripped.strip_prefix('@') {
			None => Self::parse_naked_path(stripped),
			Some(routed) => {
				let (adl, naked) = routed
					.split_once(':')
					.ok_or(ParsePathError::AdlWithoutColon)?;

				for domain in adl.split(",@") {
					Domain::from_str(domain)?;
				}
				Self::parse_naked_path(naked)
			}
		}
	}
}

#[derive(Error, Debug)]
pub enum ParsePathError {
	#[error("no enclosing angle brackets")]
	Brackets,
	#[error("no @")]
	NoAtSign,
	#[error("ADL syntax without colon")]
	AdlWithoutColon,
	#[error("invalid local part")]
	InvalidLocalPart(#[from] InvalidLocalPart),
	#[error("invalid domain")]
	InvalidDomain(#[from] ParseDomainError),
}
