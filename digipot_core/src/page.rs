//! Menu pages and the edge subscriptions each one holds while active.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    MainSelect,
    VarConstChoice,
    PotAdjust,
    ConstantSelect,
}

impl Page {
    pub fn name(self) -> &'static str {
        match self {
            Page::MainSelect => "main_select",
            Page::VarConstChoice => "var_const_choice",
            Page::PotAdjust => "pot_adjust",
            Page::ConstantSelect => "constant_select",
        }
    }

    /// Edge streams a page listens to while it is active. With a single
    /// channel there is nothing to pick on MainSelect, so rotation stays
    /// detached there.
    pub fn subscriptions(self, channels: usize) -> Subscriptions {
        match self {
            Page::MainSelect => Subscriptions {
                rotation: channels > 1,
                press: true,
                release: false,
            },
            Page::VarConstChoice => Subscriptions {
                rotation: true,
                press: true,
                release: false,
            },
            Page::PotAdjust | Page::ConstantSelect => Subscriptions::ALL,
        }
    }

    /// Selection pages use the menu debounce interval; adjustment uses the
    /// finer one.
    pub fn is_menu(self) -> bool {
        !matches!(self, Page::PotAdjust)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which input streams reach the active page. Detached streams are dropped
/// before any gate or handler sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Subscriptions {
    pub rotation: bool,
    pub press: bool,
    pub release: bool,
}

impl Subscriptions {
    pub const NONE: Subscriptions = Subscriptions {
        rotation: false,
        press: false,
        release: false,
    };
    pub const ALL: Subscriptions = Subscriptions {
        rotation: true,
        press: true,
        release: true,
    };
}

/// Choice offered on the Variable/Constant page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarConst {
    #[default]
    Variable,
    Constant,
}

impl VarConst {
    pub fn toggled(self) -> Self {
        match self {
            VarConst::Variable => VarConst::Constant,
            VarConst::Constant => VarConst::Variable,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VarConst::Variable => "Variable",
            VarConst::Constant => "Constant",
        }
    }
}
