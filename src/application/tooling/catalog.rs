use crate::domain::ToolDescriptor;
use std::collections::BTreeMap;

const GETTIME_GUIDANCE: &str = "Returns the current date and time. Use ONLY when the user explicitly \
asks for the current time or date, such as \"what time is it?\" or \"what is today's date?\". \
Never use it for greetings or casual conversation.";

/// Read-only view over the tools a server advertised, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn as_slice(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Copy of the catalog where every tool without a description gets one.
    /// Descriptions the server provided are left alone.
    pub fn enrich(&self, hints: &DescriptionHints) -> ToolCatalog {
        let tools = self
            .tools
            .iter()
            .map(|tool| {
                if tool.has_description() {
                    tool.clone()
                } else {
                    ToolDescriptor {
                        description: hints.describe(&tool.name),
                        ..tool.clone()
                    }
                }
            })
            .collect();
        ToolCatalog { tools }
    }
}

impl<'a> IntoIterator for &'a ToolCatalog {
    type Item = &'a ToolDescriptor;
    type IntoIter = std::slice::Iter<'a, ToolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}

/// Fallback descriptions for tools the server left undocumented. Configured
/// entries win over the built-in ones.
#[derive(Debug, Clone, Default)]
pub struct DescriptionHints {
    configured: BTreeMap<String, String>,
}

impl DescriptionHints {
    pub fn new(configured: BTreeMap<String, String>) -> Self {
        Self { configured }
    }

    pub fn describe(&self, name: &str) -> String {
        if let Some(text) = self
            .configured
            .get(name)
            .filter(|text| !text.trim().is_empty())
        {
            return text.clone();
        }
        match name {
            "gettime" => GETTIME_GUIDANCE.to_string(),
            other => format!("Tool {other}. Use only when necessary."),
        }
    }
}
