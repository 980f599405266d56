//! Node label templates
//!
//! A template is Graphviz HTML-like text with two kinds of markup:
//!
//! - `{field}` is replaced by the node's value for `field`, or by nothing
//!   when the node has no such value;
//! - `<%if {field}: body%>` keeps `body` only when `field` has a value.
//!
//! Placeholders that name no known field are left as written.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use topowalk_discovery::{Node, StackMember, VssMember};

/// Fields a template may reference
pub const FIELDS: &[&str] = &[
    "name",
    "ip",
    "plat",
    "ios",
    "serial",
    "bootfile",
    "router",
    "ospf_id",
    "bgp_las",
    "hsrp_pri",
    "hsrp_vip",
    "vpc_domain",
    "stack_count",
    "vss_domain",
];

fn conditional_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<%if \{(\w+)\}:\s?(.*?)%>").expect("valid regex"))
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("valid regex"))
}

/// Source of field values for one vertex
pub trait FieldSource {
    /// Value of `field`, `None` when unknown or empty
    fn field(&self, field: &str) -> Option<String>;
}

impl FieldSource for Node {
    fn field(&self, field: &str) -> Option<String> {
        let value = match field {
            "name" => Some(self.name.clone()),
            "ip" => Some(self.best_ip()),
            "plat" => self.platform.clone(),
            "ios" => self.software.clone(),
            "serial" => self.serial.clone(),
            "bootfile" => self.bootfile.clone(),
            "router" => self.router.filter(|&r| r).map(|_| "yes".to_string()),
            "ospf_id" => self.ospf_id.clone(),
            "bgp_las" => self.bgp_las.clone(),
            "hsrp_pri" => self.hsrp_pri.clone(),
            "hsrp_vip" => self.hsrp_vip.clone(),
            "vpc_domain" => self.vpc_domain.clone(),
            "stack_count" => self
                .stack
                .is_stacked()
                .then(|| self.stack.count.to_string()),
            "vss_domain" => self
                .vss
                .enabled
                .then(|| self.vss.domain.clone())
                .flatten(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }
}

/// A Stackwise member drawn as its own vertex
pub struct StackMemberView<'a> {
    pub node: &'a Node,
    pub member: &'a StackMember,
}

impl FieldSource for StackMemberView<'_> {
    fn field(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(format!("{} [{}]", self.node.name, self.member.num)),
            "plat" => self.member.platform.clone().or_else(|| self.node.field(field)),
            "serial" => self.member.serial.clone(),
            "ios" => self.member.image.clone().or_else(|| self.node.field(field)),
            "stack_count" => None,
            _ => self.node.field(field),
        }
        .filter(|v| !v.is_empty())
    }
}

/// One VSS chassis drawn as its own vertex
pub struct VssMemberView<'a> {
    pub node: &'a Node,
    pub num: usize,
    pub member: &'a VssMember,
}

impl FieldSource for VssMemberView<'_> {
    fn field(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(format!("{} [{}]", self.node.name, self.num)),
            "plat" => self.member.platform.clone().or_else(|| self.node.field(field)),
            "serial" => self.member.serial.clone(),
            "ios" => self.member.software.clone().or_else(|| self.node.field(field)),
            _ => self.node.field(field),
        }
        .filter(|v| !v.is_empty())
    }
}

/// Escape text for a Graphviz HTML-like label
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn is_known(field: &str) -> bool {
    FIELDS.contains(&field)
}

/// Render `template` with values from `source`.
///
/// Substituted values are HTML-escaped; the template text itself is not.
pub fn render(template: &str, source: &dyn FieldSource) -> String {
    let kept = conditional_re().replace_all(template, |caps: &Captures| {
        if source.field(&caps[1]).is_some() {
            caps[2].to_string()
        } else {
            String::new()
        }
    });

    field_re()
        .replace_all(&kept, |caps: &Captures| {
            let field = &caps[1];
            if !is_known(field) {
                return caps[0].to_string();
            }
            source
                .field(field)
                .map(|v| escape_html(&v))
                .unwrap_or_default()
        })
        .into_owned()
}
