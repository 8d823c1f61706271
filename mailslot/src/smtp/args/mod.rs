mod domain;
mod localpart;
mod path;
mod validator;

pub use domain::*;
pub use localpart::*;
pub use path::*;
pub use validator::*;

#[cfg(test)]
mod test {
	use std::str::FromStr;

	use super::*;

	fn valid_hostnames() -> Vec<String> {
		let mut valid = vec![];
		let should_pass = ["domain", "0domain", "domain0", "0-domain", "domain-0"];

		for name in should_pass {
			valid.push(name.to_string());
		}

		// ... as well as when joined with a dot
		for name in should_pass {
			for name2 in should_pass {
				valid.push(format!("{}.{}", name, name2));
			}
		}

		valid
	}

	fn invalid_hostnames() -> Vec<String> {
		let mut invalid = vec![String::from(""), String::from("dom ain"), String::from("a..b")];

		for domain in valid_hostnames() {
			// No leading/trailing dots or hyphens
			invalid.push(format!(".{}", domain));
			invalid.push(format!("{}.", domain));
			invalid.push(format!("-{}", domain));
			invalid.push(format!("{}-", domain));
		}

		invalid
	}

	fn valid_address_literals() -> Vec<String> {
		vec![
			String::from("[10.0.0.0]"),
			String::from("[192.168.1.1]"),
			String::from("[IPv6:a0:40:29:bf:de:28:8c:ea]"), //full
			String::from("[IPv6:a0:40::de:28:8c:ea]"),      //compressed
		]
	}

	fn invalid_address_literals() -> Vec<String> {
		vec![
			String::from("[10.0.0.0"),                 // unclosed brackets
			String::from("10.0.0.1]"),                 // unopened
			String::from("[192.168.1.256]"),           // invalid IPv4
			String::from("[a0:40:29:bf:de:28:8c:ea]"), //no IPv6 tag
			String::from("[IPv6:192.168.1.1]"),        //IPv6 but it's v4
		]
	}

	fn valid_localparts() -> Vec<String> {
		vec![
			String::from("\"\""),
			String::from("user"),
			String::from("User.Name"),
			String::from("user+tag"),
			String::from("\"user user\""),
			String::from("\"user \\\" user\""),
			String::from("\"user %#W$@\""),
		]
	}

	fn invalid_localparts() -> Vec<String> {
		vec![
			String::from(""),
			String::from("\""),         //one quote
			String::from(".user"),      //leading dot
			String::from("user user"),  //space without quote string
			String::from("user."),      //trailing dot
			String::from("\"\"\""),     //triple quote
			String::from("\"user\\\""), //single backslash
		]
	}

	#[test]
	fn domain_pass() {
		for domain in valid_hostnames().iter().chain(&valid_address_literals()) {
			assert!(Domain::from_str(domain).is_ok(), "failed on {}", domain)
		}
	}

	#[test]
	fn domain_fail() {
		for domain in invalid_hostnames().iter().chain(&invalid_address_literals()) {
			assert!(Domain::from_str(domain).is_err(), "passed on {}", domain)
		}
	}

	#[test]
	fn localpart_pass_and_fail() {
		for local in valid_localparts() {
			assert!(LocalPart::from_str(&local).is_ok(), "failed on {}", local);
		}
		for local in invalid_localparts() {
			assert!(LocalPart::from_str(&local).is_err(), "passed on {}", local);
		}
	}

	#[test]
	fn path_pass() {
		for local in valid_localparts() {
			let path = format!("<{}@example.com>", local);
			assert!(Path::from_str(&path).is_ok(), "failed on {}", path);
		}

		let routed = Path::from_str("<@relay.example,@other.example:user@example.com>").unwrap();
		assert_eq!(routed.to_string(), "<user@example.com>");
	}

	#[test]
	fn path_fail() {
		let paths = [
			"user@example.com",                  // no brackets
			"<user@example.com",                 // unclosed
			"<postmaster>",                      // no domain to look up
			"<user>",                            // no @
			"<user@>",                           // no domain
			"<@example.com>",                    // no local part
			"<@relay.example user@example.com>", // ADL without colon
			"<@-relay:user@example.com>",        // bad ADL domain
			"<user@exa mple.com>",
		];

		for path in paths {
			assert!(Path::from_str(path).is_err(), "passed on {}", path);
		}
	}

	#[test]
	fn mailbox_lowercases_only_the_domain() {
		let path = Path::from_str("<Nobody@Example.COM>").unwrap();

		assert_eq!(path.mailbox(), "Nobody@example.com");
		assert_eq!(path.to_string(), "<Nobody@Example.COM>");
	}

	#[test]
	fn mailbox_with_literal() {
		let path = Path::from_str("<root@[IPv6:A0:40::1]>").unwrap();

		assert_eq!(path.mailbox(), "root@[IPv6:a0:40::1]");
	}
}
