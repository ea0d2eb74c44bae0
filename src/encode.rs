// src/encode.rs

//! Depslist text formats
//!
//! Two line formats share the layout `<id> <size> <dep>...`:
//!
//! - unordered: dependencies are package ids, `a|b` alternations, or
//!   `NOTFOUND_<capability>` markers; lines sorted by id
//! - ordered: package ids are replaced by their install position; lines in
//!   install order
//!
//! Both formats can be parsed back with [`parse_unordered_line`] and
//! [`parse_ordered_line`].

use crate::error::{Error, Result};
use crate::resolver::graph::leaves;
use crate::resolver::{Dependency, InstallOrder, Package, Resolution, ResolutionContext};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Prefix of the token written for a requirement nothing provides
pub const UNRESOLVED_PREFIX: &str = "NOTFOUND_";

/// Separator between alternation members
pub const ALTERNATION_SEPARATOR: char = '|';

/// A dependency token of a depslist line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<R> {
    /// A package (id or position)
    Ref(R),
    /// Any one of these packages
    Alternation(Vec<R>),
    /// `NOTFOUND_<capability>`
    Unresolved(String),
}

/// One parsed depslist line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepslistLine<R> {
    pub id: String,
    pub size: u64,
    pub deps: Vec<Token<R>>,
}

/// Render a dependency with package ids
pub fn render_dependency(dep: &Dependency) -> String {
    match dep {
        Dependency::Resolved(id) => id.to_string(),
        Dependency::Alternation(ids) => join_alternation(ids.iter().map(|id| id.to_string())),
        Dependency::Unresolved(capability) => unresolved_token(capability),
    }
}

/// `NOTFOUND_<capability>`, whitespace replaced by `_` to keep one token
fn unresolved_token(capability: &str) -> String {
    let name: String = capability
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}{}", UNRESOLVED_PREFIX, name)
}

fn join_alternation(members: impl Iterator<Item = String>) -> String {
    members
        .collect::<Vec<_>>()
        .join(&ALTERNATION_SEPARATOR.to_string())
}

/// Encode one unordered line (without newline)
pub fn encode_unordered(package: &Package, deps: &BTreeSet<Dependency>) -> String {
    let mut tokens: Vec<String> = deps.iter().map(render_dependency).collect();
    tokens.sort();

    let mut line = format!("{} {}", package.id, package.size);
    for token in tokens {
        line.push(' ');
        line.push_str(&token);
    }
    line
}

/// Encode one ordered line (without newline)
///
/// Resolved positions come first in ascending order, then alternations,
/// then unresolved markers. An alternation the package itself belongs to
/// is satisfied by the package and left out. References to packages from
/// a later batch are logged.
pub fn encode_ordered(
    package: &Package,
    deps: &BTreeSet<Dependency>,
    order: &InstallOrder,
) -> String {
    let mut positions = Vec::new();
    let mut alternations = Vec::new();
    let mut unresolved = Vec::new();

    for dep in deps {
        match dep {
            Dependency::Resolved(id) => {
                if let Some(position) = order.position(id.as_str()) {
                    verify_batch(package, id.as_str(), order);
                    positions.push(position);
                }
            }
            Dependency::Alternation(ids) => {
                if ids.contains(&package.id) {
                    debug!("{} satisfies {} itself", package.id, render_dependency(dep));
                    continue;
                }
                let members: Vec<String> = ids
                    .iter()
                    .filter_map(|id| {
                        verify_batch(package, id.as_str(), order);
                        order.position(id.as_str()).map(|p| p.to_string())
                    })
                    .collect();
                if !members.is_empty() {
                    alternations.push(join_alternation(members.into_iter()));
                }
            }
            Dependency::Unresolved(capability) => {
                unresolved.push(unresolved_token(capability));
            }
        }
    }
    positions.sort_unstable();

    let mut line = format!("{} {}", package.id, package.size);
    let tokens = positions
        .into_iter()
        .map(|p| p.to_string())
        .chain(alternations)
        .chain(unresolved);
    for token in tokens {
        line.push(' ');
        line.push_str(&token);
    }
    line
}

/// Warn when `dep` comes from a later batch than `package`
fn verify_batch(package: &Package, dep: &str, order: &InstallOrder) {
    let package_batch = order.batch_of(package.id.as_str()).unwrap_or(package.batch);
    if let Some(dep_batch) = order.batch_of(dep)
        && dep_batch > package_batch
    {
        warn!(
            "{} requires {} which is in a later batch than {}",
            package.id, dep, package.id
        );
    }
}

/// Write the unordered depslist, one line per package sorted by id
pub fn write_unordered<W: Write>(
    out: &mut W,
    ctx: &ResolutionContext,
    resolution: &Resolution,
) -> Result<()> {
    let empty = BTreeSet::new();
    for package in ctx.packages().values() {
        let deps = resolution.direct.get(package.id.as_str()).unwrap_or(&empty);
        writeln!(out, "{}", encode_unordered(package, deps))?;
    }
    Ok(())
}

/// Write the ordered depslist, one line per package in install order
pub fn write_ordered<W: Write>(
    out: &mut W,
    ctx: &ResolutionContext,
    resolution: &Resolution,
) -> Result<()> {
    let empty = BTreeSet::new();
    for id in resolution.order.packages() {
        let Some(package) = ctx.package(id.as_str()) else {
            continue;
        };
        let deps = resolution.closed.get(id.as_str()).unwrap_or(&empty);
        writeln!(out, "{}", encode_ordered(package, deps, &resolution.order))?;
    }
    Ok(())
}

/// Write an HTML report of the direct dependencies
pub fn write_html<W: Write>(
    out: &mut W,
    ctx: &ResolutionContext,
    resolution: &Resolution,
) -> Result<()> {
    writeln!(out, "<html><dl>")?;
    let empty = BTreeSet::new();
    for package in ctx.packages().values() {
        write!(out, "<dt>{}<dd>", escape_html(package.id.as_str()))?;
        let deps = resolution.direct.get(package.id.as_str()).unwrap_or(&empty);
        for dep in deps {
            let text = match dep {
                Dependency::Unresolved(_) => render_dependency(dep),
                _ => dep
                    .members()
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(" or "),
            };
            write!(out, "{}<br>", escape_html(&text))?;
        }
        writeln!(out)?;
    }
    writeln!(out, "</dl></html>")?;
    Ok(())
}

/// Write the ids of packages nothing depends on, one per line
pub fn write_leaves<W: Write>(out: &mut W, resolution: &Resolution) -> Result<()> {
    for id in leaves(&resolution.direct) {
        writeln!(out, "{}", id)?;
    }
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Create an output file, reporting which path failed
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_line<R: FromStr>(text: &str, line: usize) -> Result<DepslistLine<R>> {
    let invalid = |reason: String| Error::InvalidLine { line, reason };

    let mut fields = text.split_whitespace();
    let id = fields
        .next()
        .ok_or_else(|| invalid("empty line".to_string()))?
        .to_string();
    let size = fields
        .next()
        .ok_or_else(|| invalid(format!("missing size for {}", id)))?
        .parse::<u64>()
        .map_err(|e| invalid(format!("bad size for {}: {}", id, e)))?;

    let parse_ref = |s: &str| {
        s.parse::<R>()
            .map_err(|_| invalid(format!("bad reference '{}' in {}", s, id)))
    };

    let mut deps = Vec::new();
    for field in fields {
        let token = if let Some(capability) = field.strip_prefix(UNRESOLVED_PREFIX) {
            Token::Unresolved(capability.to_string())
        } else if field.contains(ALTERNATION_SEPARATOR) {
            Token::Alternation(
                field
                    .split(ALTERNATION_SEPARATOR)
                    .map(|member| parse_ref(member))
                    .collect::<Result<Vec<_>>>()?,
            )
        } else {
            Token::Ref(parse_ref(field)?)
        };
        deps.push(token);
    }

    Ok(DepslistLine { id, size, deps })
}

/// Parse an unordered depslist line; `line` is used in error messages
pub fn parse_unordered_line(text: &str, line: usize) -> Result<DepslistLine<String>> {
    parse_line(text, line)
}

/// Parse an ordered depslist line; `line` is used in error messages
pub fn parse_ordered_line(text: &str, line: usize) -> Result<DepslistLine<usize>> {
    parse_line(text, line)
}
