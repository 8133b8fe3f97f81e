//! 本地玩家输入
//!
//! 走法输入为两个字符：列字母 `a`-`h` 加行数字 `1`-`8`，且必须在合法走法集合中，
//! 否则重新提示。

use std::collections::{HashSet, VecDeque};
use std::io::{self, BufRead, Write};

use protocol::{format_moves, Color, Move};

use crate::error::{NetError, Result};

/// 本地输入来源
pub trait InputSource: Send {
    /// 显示提示并读取一行，输入结束时返回 None
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// 向玩家显示一条信息
    fn notify(&mut self, text: &str);
}

/// 控制台输入
#[derive(Debug, Default)]
pub struct ConsoleInput;

impl InputSource for ConsoleInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn notify(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// 预设输入序列，记录所有提示与通知
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    pub prompts: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            notices: Vec::new(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }

    fn notify(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
}

/// 解析并校验一行输入
pub fn parse_input(legal_moves: &HashSet<Move>, input: &str) -> Option<Move> {
    Move::from_notation(input.trim()).filter(|mv| legal_moves.contains(mv))
}

/// 反复提示直到读到一步合法走法
pub fn read_legal_move(
    input: &mut dyn InputSource,
    color: Color,
    legal_moves: &HashSet<Move>,
) -> Result<Move> {
    let prompt = format!("[Your turn - {}] Enter your move: ", color);
    loop {
        let line = input.read_line(&prompt)?.ok_or(NetError::InputClosed)?;
        if let Some(mv) = parse_input(legal_moves, &line) {
            return Ok(mv);
        }
        input.notify(&format!(
            "Invalid move. Legal moves: {}",
            format_moves(legal_moves)
        ));
    }
}
