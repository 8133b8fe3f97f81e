//! 棋盘协作接口
//!
//! 规则与合法走法生成不属于联机层，这里只定义适配器需要的接口，
//! 外加一个所有空格都可落子的简易棋盘，供控制台对战和测试使用。

use std::collections::HashSet;

use protocol::{Color, Move, BOARD_SIZE};

/// 棋盘：为指定颜色提供合法走法集合
pub trait Board {
    fn legal_moves(&self, color: Color) -> HashSet<Move>;
}

impl Board for HashSet<Move> {
    fn legal_moves(&self, _color: Color) -> HashSet<Move> {
        self.clone()
    }
}

const CELLS: usize = (BOARD_SIZE * BOARD_SIZE) as usize;

/// 简易 8x8 棋盘：任意空格都是合法落点
#[derive(Debug, Clone)]
pub struct OpenBoard {
    cells: [Option<Color>; CELLS],
}

impl OpenBoard {
    pub fn new() -> Self {
        Self { cells: [None; CELLS] }
    }

    fn index(mv: Move) -> Option<usize> {
        mv.is_on_board()
            .then(|| (mv.y * BOARD_SIZE + mv.x) as usize)
    }

    pub fn get(&self, mv: Move) -> Option<Color> {
        Self::index(mv).and_then(|i| self.cells[i])
    }

    /// 落子，位置越界或已被占用时返回 false
    pub fn place(&mut self, mv: Move, color: Color) -> bool {
        match Self::index(mv) {
            Some(i) if self.cells[i].is_none() => {
                self.cells[i] = Some(color);
                true
            }
            _ => false,
        }
    }

    pub fn count(&self, color: Color) -> usize {
        self.cells.iter().filter(|c| **c == Some(color)).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

impl Default for OpenBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Board for OpenBoard {
    fn legal_moves(&self, _color: Color) -> HashSet<Move> {
        (0..BOARD_SIZE)
            .flat_map(|y| (0..BOARD_SIZE).map(move |x| Move::new(x, y)))
            .filter(|mv| self.get(*mv).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_and_legal_moves() {
        let mut board = OpenBoard::new();
        assert_eq!(board.legal_moves(Color::Black).len(), 64);

        assert!(board.place(Move::new(2, 3), Color::Black));
        assert!(!board.place(Move::new(2, 3), Color::White));
        assert!(!board.place(Move::new(8, 0), Color::White));

        let legal = board.legal_moves(Color::White);
        assert_eq!(legal.len(), 63);
        assert!(!legal.contains(&Move::new(2, 3)));
        assert_eq!(board.get(Move::new(2, 3)), Some(Color::Black));
        assert_eq!(board.count(Color::Black), 1);
        assert_eq!(board.count(Color::White), 0);
    }

    #[test]
    fn test_full_board() {
        let mut board = OpenBoard::new();
        for mv in board.legal_moves(Color::Black) {
            board.place(mv, Color::White);
        }
        assert!(board.is_full());
        assert!(board.legal_moves(Color::Black).is_empty());
    }
}
