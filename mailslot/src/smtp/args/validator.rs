use pest::Parser;
use pest_derive::*;

#[derive(Parser)]
#[grammar = "smtp/args/smtp_grammar.pest"]
pub struct GrammarParser;

pub struct Validator;
impl Validator {
	pub fn validate_local_part(local: &str) -> bool {
		GrammarParser::parse(Rule::validate_local_part, local).is_ok()
	}

	/// Hostnames only. Address literals are handled by [`super::Domain`].
	pub fn validate_domain(domain: &str) -> bool {
		GrammarParser::parse(Rule::validate_domain, domain).is_ok()
	}
}
