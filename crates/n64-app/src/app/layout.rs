/// Presentational layout of the page. Flipping it never touches the module.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    Desktop,
    Mobile,
}

impl Layout {
    pub fn toggled(self) -> Self {
        match self {
            Layout::Desktop => Layout::Mobile,
            Layout::Mobile => Layout::Desktop,
        }
    }

    pub fn is_mobile(self) -> bool {
        self == Layout::Mobile
    }

    /// Label for the toggle button, naming the layout it switches to
    pub fn toggle_label(self) -> &'static str {
        match self {
            Layout::Desktop => "Mobile layout",
            Layout::Mobile => "Desktop layout",
        }
    }
}
