//! 走法（棋盘坐标）与代数记谱
//!
//! 坐标以 0 为起点：列 `x` 对应字母 `a`-`h`，行 `y` 对应数字 `1`-`8`。
//! 协议层不做范围检查，合法性由棋盘负责。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;

/// 一步走法，即落子的棋盘坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Move {
    /// 列
    pub x: i32,
    /// 行
    pub y: i32,
}

impl Move {
    /// 创建走法
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 是否落在 8x8 棋盘内
    pub fn is_on_board(&self) -> bool {
        (0..BOARD_SIZE).contains(&self.x) && (0..BOARD_SIZE).contains(&self.y)
    }

    /// 解析两字符记谱（如 `c4`），大小写不敏感
    pub fn from_notation(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let (col, row) = match (chars.next(), chars.next(), chars.next()) {
            (Some(col), Some(row), None) => (col.to_ascii_lowercase(), row),
            _ => return None,
        };

        if !('a'..='h').contains(&col) || !('1'..='8').contains(&row) {
            return None;
        }

        let x = col as i32 - 'a' as i32;
        let y = row as i32 - '1' as i32;
        Some(Self { x, y })
    }

    /// 转换为两字符记谱，棋盘外坐标返回 None
    pub fn to_notation(&self) -> Option<String> {
        if !self.is_on_board() {
            return None;
        }
        let col = (b'a' + self.x as u8) as char;
        let row = (b'1' + self.y as u8) as char;
        Some(format!("{}{}", col, row))
    }
}

impl From<(i32, i32)> for Move {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Move> for (i32, i32) {
    fn from(mv: Move) -> Self {
        (mv.x, mv.y)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_notation() {
            Some(notation) => f.write_str(&notation),
            None => write!(f, "({},{})", self.x, self.y),
        }
    }
}

/// 以逗号分隔的记谱列表（按坐标排序），用于提示合法走法
pub fn format_moves<'a>(moves: impl IntoIterator<Item = &'a Move>) -> String {
    let mut sorted: Vec<&Move> = moves.into_iter().collect();
    sorted.sort();
    sorted
        .iter()
        .map(|mv| mv.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
