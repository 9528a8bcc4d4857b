//! Line-dispatch parser for the subset of dhcpd.conf that VMware writes.
//!
//! Every line is classified into a [`Line`] on its own. The parser then walks
//! the classified lines with a two-state scope machine: top level or inside a
//! subnet block. Statements only count inside a subnet, and any `}` line ends
//! it. Lines that classify as [`Line::Noise`] are ignored wherever they appear.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::{debug, warn};

use super::lexer::{tokenize, Token};
use super::{DhcpdConfig, DhcpdParseError, SubnetDecl};
use crate::ip::summarize_range;

/// Options whose addresses must never be handed out as fixed addresses
pub const RESERVED_ADDRESS_OPTIONS: &[&str] = &[
    "broadcast-address",
    "domain-name-servers",
    "netbios-name-servers",
    "routers",
];

/// Header of a block opened on a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockHeader {
    Subnet { address: String, netmask: String },
    Host { name: String },
    Other { keyword: String },
}

/// Classification of one config line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Open(BlockHeader),
    Close,
    /// Tokens of a statement, without the terminating semicolon
    Statement(Vec<Token>),
    Noise,
}

/// A statement inside a subnet block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Range { start: Ipv4Addr, end: Ipv4Addr },
    ReservedAddresses { option: String, addresses: Vec<Ipv4Addr> },
    DomainName(String),
    Other(String),
}

fn is_brace(token: &Token) -> bool {
    matches!(token, Token::LeftBrace | Token::RightBrace)
}

fn classify_open(tokens: &[Token]) -> Option<BlockHeader> {
    let opens = tokens.iter().filter(|t| **t == Token::LeftBrace).count();
    let closes = tokens.iter().filter(|t| **t == Token::RightBrace).count();
    if opens != closes + 1 {
        return None;
    }

    match tokens {
        [Token::Word(keyword), Token::Word(address), Token::Word(netmask_kw), Token::Word(netmask), Token::LeftBrace, ..]
            if keyword == "subnet" && netmask_kw == "netmask" =>
        {
            Some(BlockHeader::Subnet {
                address: address.clone(),
                netmask: netmask.clone(),
            })
        }
        [keyword, name, Token::LeftBrace, ..] if keyword.is_word("host") => Some(BlockHeader::Host {
            name: name.text()?.to_string(),
        }),
        [Token::Word(keyword), ..] => Some(BlockHeader::Other {
            keyword: keyword.clone(),
        }),
        _ => None,
    }
}

/// Classify a single line
pub fn classify(line: &str) -> Line {
    let Some(tokens) = tokenize(line) else {
        return Line::Noise;
    };

    if tokens == [Token::RightBrace] {
        return Line::Close;
    }
    if tokens.iter().any(is_brace) {
        return classify_open(&tokens).map(Line::Open).unwrap_or(Line::Noise);
    }
    match tokens.as_slice() {
        [body @ .., Token::Semicolon] if !body.is_empty() && !body.contains(&Token::Semicolon) => {
            Line::Statement(body.to_vec())
        }
        _ => Line::Noise,
    }
}

fn parse_address(value: &str, line: usize) -> Result<Ipv4Addr, DhcpdParseError> {
    value.parse().map_err(|_| DhcpdParseError::InvalidAddress {
        line,
        value: value.to_string(),
    })
}

/// Interpret the tokens of a statement found inside a subnet block
pub fn interpret(tokens: &[Token], line: usize) -> Result<Statement, DhcpdParseError> {
    let words: Vec<&str> = tokens.iter().filter_map(Token::text).collect();

    match words.as_slice() {
        ["range", rest @ ..] => {
            let addresses = match rest {
                ["dynamic-bootp", tail @ ..] => tail,
                _ => rest,
            };
            let (start, end) = match addresses {
                [] => return Err(DhcpdParseError::MissingAddress { line }),
                [single] => {
                    let address = parse_address(single, line)?;
                    (address, address)
                }
                [start, end, ..] => (parse_address(start, line)?, parse_address(end, line)?),
            };
            if start > end {
                return Err(DhcpdParseError::InvalidRange { line, start, end });
            }
            Ok(Statement::Range { start, end })
        }
        ["option", "domain-name", name, ..] => Ok(Statement::DomainName(name.trim_matches('"').to_string())),
        ["option", option, values @ ..] if RESERVED_ADDRESS_OPTIONS.contains(option) => {
            let addresses = values
                .iter()
                .map(|value| parse_address(value, line))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Statement::ReservedAddresses {
                option: option.to_string(),
                addresses,
            })
        }
        _ => Ok(Statement::Other(words.first().copied().unwrap_or_default().to_string())),
    }
}

fn open_subnet(address: &str, netmask: &str, line: usize) -> Result<SubnetDecl, DhcpdParseError> {
    let address = parse_address(address, line)?;
    let mask: Ipv4Addr = netmask.parse().map_err(|_| DhcpdParseError::InvalidNetmask {
        line,
        value: netmask.to_string(),
    })?;
    let network = Ipv4Net::with_netmask(address, mask).map_err(|_| DhcpdParseError::InvalidNetmask {
        line,
        value: netmask.to_string(),
    })?;
    Ok(SubnetDecl::new(network.trunc()))
}

fn apply(subnet: &mut SubnetDecl, statement: Statement) {
    match statement {
        Statement::Range { start, end } => {
            // A range is part of the subnet, not a network of its own
            subnet.reserved.extend(summarize_range(start, end));
        }
        Statement::ReservedAddresses { addresses, .. } => {
            subnet
                .reserved
                .extend(addresses.into_iter().map(Ipv4Net::from));
        }
        Statement::DomainName(name) => subnet.domain = Some(name),
        Statement::Other(keyword) => debug!("Ignoring subnet statement {:?}", keyword),
    }
}

#[derive(Clone, Copy)]
enum Scope {
    Top,
    Subnet,
}

/// Parse dhcpd.conf text.
///
/// Block scanning is flat: the first `}` alone on a line after a subnet
/// header returns to the top level, even when a nested block such as
/// `pool {` was opened in between.
pub fn parse_dhcpd_conf(content: &str) -> Result<DhcpdConfig, DhcpdParseError> {
    let mut config = DhcpdConfig::default();
    let mut scope = Scope::Top;

    for (index, text) in content.lines().enumerate() {
        let line = index + 1;
        let classified = classify(text);

        scope = match (scope, classified) {
            (Scope::Top, Line::Open(BlockHeader::Subnet { address, netmask })) => {
                let subnet = open_subnet(&address, &netmask, line)?;
                if let Some(previous) = &config.subnet {
                    warn!(
                        "Subnet {} on line {} replaces earlier subnet {}",
                        subnet.network, line, previous.network
                    );
                }
                config.subnet = Some(subnet);
                Scope::Subnet
            }
            (Scope::Top, Line::Open(BlockHeader::Host { name })) => {
                // Existing fixed-address entries are not read back
                debug!("Ignoring host block {:?} on line {}", name, line);
                Scope::Top
            }
            (Scope::Top, Line::Open(BlockHeader::Other { keyword })) => {
                debug!("Ignoring {:?} block on line {}", keyword, line);
                Scope::Top
            }
            (Scope::Top, _) => Scope::Top,

            (Scope::Subnet, Line::Open(header)) => {
                debug!("Ignoring nested block header {:?} on line {}", header, line);
                Scope::Subnet
            }
            (Scope::Subnet, Line::Close) => Scope::Top,
            (Scope::Subnet, Line::Statement(tokens)) => {
                let statement = interpret(&tokens, line)?;
                if let Some(subnet) = config.subnet.as_mut() {
                    apply(subnet, statement);
                }
                Scope::Subnet
            }
            (Scope::Subnet, Line::Noise) => Scope::Subnet,
        };
    }

    if matches!(scope, Scope::Subnet) {
        warn!("dhcpd config ends inside an unclosed subnet block");
    }

    Ok(config)
}
