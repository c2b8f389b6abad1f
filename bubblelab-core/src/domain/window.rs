//! Named historical bubble windows.
//!
//! A window is a fixed, immutable month range flagged as a speculative
//! episode. The canonical set covers three episodes; callers may supply
//! their own set through configuration. Windows must not overlap so that
//! every row receives at most one label.

use super::month::Month;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named historical episode with an inclusive month range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleWindow {
    pub name: String,
    pub start: Month,
    pub end: Month,
}

impl BubbleWindow {
    pub fn new(name: impl Into<String>, start: Month, end: Month) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, month: Month) -> bool {
        self.start <= month && month <= self.end
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window '{name}' has start {start} after end {end}")]
    Inverted {
        name: String,
        start: Month,
        end: Month,
    },

    #[error("windows '{first}' and '{second}' overlap")]
    Overlap { first: String, second: String },
}

/// An ordered set of non-overlapping bubble windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BubbleWindow>", into = "Vec<BubbleWindow>")]
pub struct BubbleWindowSet {
    windows: Vec<BubbleWindow>,
}

impl BubbleWindowSet {
    /// Validate and wrap a list of windows, preserving order.
    pub fn new(windows: Vec<BubbleWindow>) -> Result<Self, WindowError> {
        for w in &windows {
            if w.start > w.end {
                return Err(WindowError::Inverted {
                    name: w.name.clone(),
                    start: w.start,
                    end: w.end,
                });
            }
        }
        for (i, a) in windows.iter().enumerate() {
            for b in &windows[i + 1..] {
                if a.start <= b.end && b.start <= a.end {
                    return Err(WindowError::Overlap {
                        first: a.name.clone(),
                        second: b.name.clone(),
                    });
                }
            }
        }
        Ok(Self { windows })
    }

    /// The three canonical episodes.
    ///
    /// The housing window starts where the dot-com window ends so the
    /// non-overlap invariant holds and every month has one unambiguous label.
    pub fn canonical() -> Self {
        Self {
            windows: vec![
                BubbleWindow::new("nifty_fifty", Month::new(1968, 1), Month::new(1975, 12)),
                BubbleWindow::new("dot_com", Month::new(1995, 1), Month::new(2002, 12)),
                BubbleWindow::new("housing", Month::new(2003, 1), Month::new(2010, 12)),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BubbleWindow> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Name of the window containing `month`, if any.
    pub fn label_for(&self, month: Month) -> Option<&str> {
        self.windows
            .iter()
            .find(|w| w.contains(month))
            .map(|w| w.name.as_str())
    }
}

impl TryFrom<Vec<BubbleWindow>> for BubbleWindowSet {
    type Error = WindowError;

    fn try_from(windows: Vec<BubbleWindow>) -> Result<Self, Self::Error> {
        Self::new(windows)
    }
}

impl From<BubbleWindowSet> for Vec<BubbleWindow> {
    fn from(set: BubbleWindowSet) -> Self {
        set.windows
    }
}
