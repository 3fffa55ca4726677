//! Prompt construction for configuration generation.

use serde::{Deserialize, Serialize};

/// Host network introspection output offered to the model as context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    /// Output of `ip route`.
    pub routes: Option<String>,
    /// Output of `ip link show` (or `ip address`).
    pub links: Option<String>,
}

impl HostContext {
    pub fn new(routes: Option<String>, links: Option<String>) -> Self {
        Self {
            routes: non_blank(routes),
            links: non_blank(links),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_none() && self.links.is_none()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

const INSTRUCTIONS: &str = "\
You are an expert in Kubernetes networking and CNI plugins.
Write a CNI configuration in JSON for use in a Multus NetworkAttachmentDefinition.

Rules:
- Reply with exactly one JSON object inside a single ```json fenced code block.
- The object must include \"cniVersion\" and a top-level string \"name\".
- The \"name\" must be a valid Kubernetes object name (lowercase letters, digits and dashes).
- Use IP address management (for example host-local or whereabouts) so that pods receive an address.
- Do not put comments inside the JSON.";

/// Render the generation prompt for `hint`.
///
/// The same hint and context always produce the same prompt.
pub fn render_prompt(hint: &str, context: &HostContext) -> String {
    let mut prompt = String::from(INSTRUCTIONS);

    if let Some(links) = &context.links {
        prompt.push_str("\n\nThe worker node has these network interfaces:\n");
        prompt.push_str(links.trim_end());
        prompt.push_str(
            "\n\nWhen the configuration needs a master or host interface, pick one of the interfaces above.",
        );
    }

    if let Some(routes) = &context.routes {
        prompt.push_str("\n\nThe worker node has these routes:\n");
        prompt.push_str(routes.trim_end());
        prompt.push_str("\n\nAvoid address ranges that overlap with the routes above.");
    }

    prompt.push_str("\n\nUser hint: ");
    prompt.push_str(hint.trim());
    prompt.push('\n');
    prompt
}
