//! 执子颜色

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// 执子颜色
///
/// 线上以整数表示：黑方 `-1`，白方 `1`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Color {
    /// 黑方（先手）
    Black,
    /// 白方（后手）
    White,
}

impl Color {
    /// 先手方
    pub const FIRST: Color = Color::Black;

    /// 后手方
    pub const SECOND: Color = Color::White;

    /// 获取对方颜色
    pub fn opponent(&self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// 线上整数值
    pub fn to_wire(self) -> i8 {
        match self {
            Color::Black => -1,
            Color::White => 1,
        }
    }

    /// 显示名称
    pub fn name(&self) -> &'static str {
        match self {
            Color::Black => "BLACK",
            Color::White => "WHITE",
        }
    }
}

impl From<Color> for i8 {
    fn from(color: Color) -> Self {
        color.to_wire()
    }
}

impl TryFrom<i8> for Color {
    type Error = ProtocolError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Color::Black),
            1 => Ok(Color::White),
            other => Err(ProtocolError::InvalidColor(other.into())),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
