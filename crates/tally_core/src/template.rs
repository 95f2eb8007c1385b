//! Button templates for counter sessions.

/// One button in a template: a stable counter key plus a display label.
///
/// The key is what counts are stored under; labels are presentation only
/// and may change without affecting stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateButton {
    key: String,
    label: String,
}

impl TemplateButton {
    /// Creates a button.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// Returns the stable counter key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A named set of counter buttons.
///
/// Templates define which counter keys a session materializes. Switching
/// templates only ever adds keys to a session's counter map, never
/// removes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    id: String,
    name: String,
    buttons: Vec<TemplateButton>,
}

impl Template {
    /// Creates a template.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, buttons: Vec<TemplateButton>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            buttons,
        }
    }

    /// Returns the template identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the buttons in display order.
    #[must_use]
    pub fn buttons(&self) -> &[TemplateButton] {
        &self.buttons
    }
}

/// Returns the built-in templates, default first.
#[must_use]
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template::new(
            "default",
            "Default",
            vec![
                TemplateButton::new("button1", "Yes"),
                TemplateButton::new("button2", "No"),
                TemplateButton::new("button3", "Maybe"),
                TemplateButton::new("button4", "Laugh"),
                TemplateButton::new("button5", "Cheer"),
                TemplateButton::new("button6", "Other"),
            ],
        ),
        Template::new(
            "minimal",
            "Minimal",
            vec![
                TemplateButton::new("button1", "Plus"),
                TemplateButton::new("button2", "Minus"),
                TemplateButton::new("button3", "Note"),
            ],
        ),
    ]
}

/// Returns the default template.
///
/// Unknown template identifiers fall back to this one, so a session
/// always has an active template.
#[must_use]
pub fn default_template() -> Template {
    builtin_templates().remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_have_stable_keys() {
        let templates = builtin_templates();
        assert!(!templates.is_empty());
        for template in &templates {
            assert!(!template.buttons().is_empty());
            for button in template.buttons() {
                assert!(button.key().starts_with("button"));
            }
        }
    }

    #[test]
    fn default_template_is_first_builtin() {
        assert_eq!(default_template().id(), builtin_templates()[0].id());
    }
}
