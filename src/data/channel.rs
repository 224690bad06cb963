//! Color channel selection.

use std::fmt;

/// Selects which color component of an RGB image an operation works on.
///
/// `All` is only meaningful for previews (an untinted view of the whole
/// image); matrix extraction requires one of the three color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Every channel at once
    All,
    /// Red component
    Red,
    /// Green component
    Green,
    /// Blue component
    Blue,
}

impl Channel {
    /// The three color channels in RGB order.
    pub const COLORS: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Index of this channel within an RGB pixel, or `None` for `All`.
    pub fn index(self) -> Option<usize> {
        match self {
            Channel::All => None,
            Channel::Red => Some(0),
            Channel::Green => Some(1),
            Channel::Blue => Some(2),
        }
    }

    /// Get the display name for this channel.
    pub fn name(self) -> &'static str {
        match self {
            Channel::All => "all",
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }

    /// Per-component multiplier used when rendering a tinted preview.
    pub fn tint(self) -> [u8; 3] {
        match self {
            Channel::All => [255, 255, 255],
            Channel::Red => [255, 0, 0],
            Channel::Green => [0, 255, 0],
            Channel::Blue => [0, 0, 255],
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
