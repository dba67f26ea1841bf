//! 折行：按单词数上限，可选再按估算行宽收紧。

use std::iter::Peekable;
use std::str::SplitWhitespace;

// 半角字符平均宽度（相对字号）
const HALF_WIDTH_EM: f32 = 0.55;
const UPPERCASE_EM: f32 = 0.68;
const SPACE_EM: f32 = 0.3;

/// 中日韩表意文字、假名与全角符号
fn is_full_width(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&ch)
        || ('\u{3040}'..='\u{30FF}').contains(&ch)
        || ('\u{FF00}'..='\u{FFEF}').contains(&ch)
}

/// 阿拉伯文变音符号叠在字母上，不占宽度
fn is_arabic_mark(ch: char) -> bool {
    ('\u{0610}'..='\u{061A}').contains(&ch)
        || ('\u{064B}'..='\u{065F}').contains(&ch)
        || ch == '\u{0670}'
        || ('\u{06D6}'..='\u{06ED}').contains(&ch)
}

fn char_em(ch: char) -> f32 {
    if is_arabic_mark(ch) {
        0.0
    } else if is_full_width(ch) {
        1.0
    } else if ch.is_whitespace() {
        SPACE_EM
    } else if ch.is_ascii_uppercase() {
        UPPERCASE_EM
    } else {
        HALF_WIDTH_EM
    }
}

/// 估算文本以 `font_size` 渲染后的宽度（像素）。
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_em).sum::<f32>() * font_size
}

/// 将文本按空白切词，每行最多 `max_words` 个单词。
///
/// 空文本不产生任何行；`max_words` 为 0 时按 1 处理。
pub fn wrap_words(text: &str, max_words: usize) -> WordLines<'_> {
    WordLines {
        words: text.split_whitespace().peekable(),
        max_words: max_words.max(1),
        budget: None,
    }
}

/// 同 [`wrap_words`]，但估算行宽超过 `max_width` 前提前换行。
/// 单个超长单词仍独占一行。
pub fn wrap_words_within(
    text: &str,
    max_words: usize,
    max_width: f32,
    font_size: f32,
) -> WordLines<'_> {
    WordLines {
        budget: Some((max_width, font_size)),
        ..wrap_words(text, max_words)
    }
}

/// 逐行迭代器（只能消费一次）。
#[derive(Debug, Clone)]
pub struct WordLines<'a> {
    words: Peekable<SplitWhitespace<'a>>,
    max_words: usize,
    budget: Option<(f32, f32)>,
}

impl Iterator for WordLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let first = self.words.next()?;
        let mut line = first.to_string();
        let mut width = self
            .budget
            .map_or(0.0, |(_, size)| estimate_text_width(first, size));

        for _ in 1..self.max_words {
            let Some(&word) = self.words.peek() else {
                break;
            };
            if let Some((max_width, size)) = self.budget {
                let next_width = width + (SPACE_EM * size) + estimate_text_width(word, size);
                if next_width > max_width {
                    break;
                }
                width = next_width;
            }
            line.push(' ');
            line.push_str(word);
            self.words.next();
        }
        Some(line)
    }
}

/// 画布宽度对应的默认每行单词数。
pub fn auto_words_per_line(width: u32) -> usize {
    ((width / 80) as usize).clamp(3, 24)
}
