use std::collections::VecDeque;
use std::fmt;

use terminal_size::{terminal_size, Width};

/// A trait for printing trees, clipping long lines to the terminal width unless `full` is set.
pub trait PrintableTree
where
    Self: fmt::Display,
{
    fn print(&self, full: bool) {
        let view = self.to_string();
        match terminal_size() {
            Some((Width(w), _)) if !full => {
                let w = w as usize;
                for line in view.lines() {
                    if line.chars().count() > w && w > 3 {
                        let clipped = line.chars().take(w - 3).collect::<String>();
                        println!("{}...", clipped);
                    } else {
                        println!("{}", line);
                    }
                }
            }
            _ => println!("{}", view),
        }
    }
}

/// Peekable and bidirectional iterator for tokenizer/parser.
#[derive(Debug)]
pub struct TokenIterator<I>
where
    I: Clone,
{
    buf: VecDeque<I>,
    pos: usize,
}

impl<I> TokenIterator<I>
where
    I: Clone,
{
    pub fn new(arr: &[I]) -> Self {
        Self {
            buf: arr.iter().cloned().collect(),
            pos: 0,
        }
    }

    pub fn peek(&self) -> Option<&I> {
        self.buf.get(self.pos)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&I> {
        self.buf.get(self.pos + n)
    }

    pub fn peek_chunk(&self, size: usize) -> Vec<Option<&I>> {
        (0..size).map(|i| self.buf.get(self.pos + i)).collect()
    }

    pub fn rewind(&mut self, steps: usize) {
        self.pos = self.pos.saturating_sub(steps);
    }

    pub fn forward(&mut self, steps: usize) {
        self.pos = self.pos.saturating_add(steps);
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }
}

impl<I> Iterator for TokenIterator<I>
where
    I: Clone,
{
    type Item = I;

    fn next(&mut self) -> Option<I> {
        let item = self.buf.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }
}
