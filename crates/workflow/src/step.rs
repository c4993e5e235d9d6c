use serde::{Deserialize, Serialize};

/// The three wizard screens: upload files, preview groups and template,
/// generate drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Upload,
    Preview,
    Generate,
}

impl WizardStep {
    pub fn next(self) -> Option<Self> {
        match self {
            WizardStep::Upload => Some(WizardStep::Preview),
            WizardStep::Preview => Some(WizardStep::Generate),
            WizardStep::Generate => None,
        }
    }

    pub fn back(self) -> Option<Self> {
        match self {
            WizardStep::Upload => None,
            WizardStep::Preview => Some(WizardStep::Upload),
            WizardStep::Generate => Some(WizardStep::Preview),
        }
    }

    /// 1-based position, as shown in the stepper.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Upload => 1,
            WizardStep::Preview => 2,
            WizardStep::Generate => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Upload => "upload",
            WizardStep::Preview => "preview",
            WizardStep::Generate => "generate",
        }
    }
}

impl core::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_linear() {
        assert_eq!(WizardStep::default().next(), Some(WizardStep::Preview));
        assert_eq!(WizardStep::Generate.next(), None);
        assert_eq!(WizardStep::Generate.back(), Some(WizardStep::Preview));
        assert_eq!(WizardStep::Upload.back(), None);
        assert_eq!(WizardStep::Preview.number(), 2);
    }
}
