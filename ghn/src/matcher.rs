//! 越南行政区划名称的归一化与匹配.
//!
//! 门店/客户填写的地址是自由文本, GHN 的基础数据则是规范名称加 NameExtension,
//! 两边先经过 [`normalize`] 再按词比较.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::types::AdministrativeUnit;

pub const PROVINCE_PREFIXES: &[&str] = &["tinh", "thanh pho", "tp"];

pub const DISTRICT_PREFIXES: &[&str] = &["quan", "huyen", "thi xa", "thanh pho", "tp", "q"];

pub const WARD_PREFIXES: &[&str] = &["phuong", "xa", "thi tran", "p"];

/// 省级常用简称
pub const PROVINCE_ALIASES: &[(&str, &str)] = &[
    ("hcm", "ho chi minh"),
    ("tp hcm", "ho chi minh"),
    ("tphcm", "ho chi minh"),
    ("sai gon", "ho chi minh"),
    ("saigon", "ho chi minh"),
    ("hn", "ha noi"),
    ("brvt", "ba ria vung tau"),
    ("vung tau", "ba ria vung tau"),
    ("hue", "thua thien hue"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Province,
    District,
    Ward,
}

impl Level {
    pub fn prefixes(self) -> &'static [&'static str] {
        match self {
            Level::Province => PROVINCE_PREFIXES,
            Level::District => DISTRICT_PREFIXES,
            Level::Ward => WARD_PREFIXES,
        }
    }

    /// 只有省级使用简称表
    pub fn aliases(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Level::Province => PROVINCE_ALIASES,
            _ => &[],
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Province => write!(f, "province"),
            Level::District => write!(f, "district"),
            Level::Ward => write!(f, "ward"),
        }
    }
}

/// 去声调, đ -> d, 小写, 非字母数字替换为空格, 合并空白
pub fn normalize(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'đ' | 'Đ' => folded.push('d'),
            c => folded.extend(c.to_lowercase()),
        }
    }

    folded
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|word| !word.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// 去掉一个行政前缀, 前缀后必须紧跟空格; 多个前缀命中时取最长的
pub fn strip_prefix<'a>(normalized: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .filter_map(|prefix| {
            let rest = normalized.strip_prefix(prefix)?.strip_prefix(' ')?;
            Some((prefix.len(), rest))
        })
        .filter(|(_, rest)| !rest.is_empty())
        .max_by_key(|(len, _)| *len)
        .map(|(_, rest)| rest)
        .unwrap_or(normalized)
}

fn alias<'a>(value: &'a str, aliases: &[(&str, &'a str)]) -> Option<&'a str> {
    aliases
        .iter()
        .find(|(short, _)| *short == value)
        .map(|(_, full)| *full)
}

/// 原文 + 去前缀, 各自再查一次简称表
pub fn variants(value: &str, prefixes: &[&str], aliases: &[(&str, &str)]) -> Vec<String> {
    let normalized = normalize(value);
    if normalized.is_empty() {
        return vec![];
    }

    let stripped = strip_prefix(&normalized, prefixes);
    let mut result: Vec<String> = Vec::with_capacity(4);
    for item in [normalized.as_str(), stripped] {
        let mapped = alias(item, aliases);
        for value in std::iter::once(item).chain(mapped) {
            if !value.is_empty() && !result.iter().any(|v| v == value) {
                result.push(value.to_string());
            }
        }
    }

    result
}

/// needle 的所有词在 haystack 中连续出现
fn contains_words(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.split(' ').collect::<Vec<&str>>();
    let needle = needle.split(' ').collect::<Vec<&str>>();
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }

    haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}

fn variant_match(a: &str, b: &str) -> bool {
    a == b || contains_words(a, b) || contains_words(b, a)
}

/// 候选文本与目标名称(及其 NameExtension)是否指向同一个行政区划
pub fn is_administrative_match(
    candidate: &str,
    target: &str,
    prefixes: &[&str],
    aliases: &[(&str, &str)],
    name_extension: &[String],
) -> bool {
    let candidates = variants(candidate, prefixes, aliases);
    if candidates.is_empty() {
        return false;
    }

    let mut targets = variants(target, prefixes, aliases);
    for extension in name_extension {
        targets.extend(variants(extension, prefixes, aliases));
    }

    candidates
        .iter()
        .any(|c| targets.iter().any(|t| variant_match(c, t)))
}

/// 在基础数据列表中找第一个匹配项
pub fn find_unit<'a, U: AdministrativeUnit>(
    candidate: &str,
    units: &'a [U],
    level: Level,
) -> Option<&'a U> {
    units.iter().find(|unit| {
        is_administrative_match(
            candidate,
            unit.name(),
            level.prefixes(),
            level.aliases(),
            unit.name_extension(),
        )
    })
}
