use bigdecimal::BigDecimal;
use chrono::{Datelike, Days, NaiveDate};
use std::str::FromStr;

use crate::error::AmountError;
use crate::models::{Direction, ParsedAmount};

/// 解析 `"<币种> <金额>[-]"` 为带方向的金额
///
/// 在第一个空格处切分. 金额部分的所有 `-` 先被去掉再解析数值, 方向只看整个
/// 输入 (去空白后) 是否以 `-` 结尾: `"EUR 1-0"` 是 10 的贷记, `"EUR 10-"` 是 10 的借记.
pub fn parse_currency_amount(raw: &str) -> Result<ParsedAmount, AmountError> {
    let trimmed = raw.trim();

    // 去空白后空格不可能在首位, 币种必然非空
    let Some((currency, numeric)) = trimmed.split_once(' ') else {
        return Err(AmountError::MissingSeparator(trimmed.to_string()));
    };

    let magnitude_text: String = numeric.chars().filter(|c| *c != '-').collect();
    if magnitude_text.is_empty() {
        return Err(AmountError::EmptyMagnitude(trimmed.to_string()));
    }

    let invalid = || AmountError::InvalidMagnitude {
        raw: trimmed.to_string(),
        magnitude: magnitude_text.clone(),
    };

    let normalized = normalize_decimal(&magnitude_text).ok_or_else(invalid)?;
    let magnitude = BigDecimal::from_str(&normalized).map_err(|_| invalid())?;

    let direction = if trimmed.ends_with('-') {
        Direction::Debit
    } else {
        Direction::Credit
    };

    Ok(ParsedAmount {
        currency: currency.to_string(),
        magnitude,
        direction,
    })
}

/// 十进制数文法: `[+]整数[.小数][(e|E)[+]指数]`
///
/// 整数和小数两边可以有一边为空 (`.50`, `100.`), 但至少要有一位数字.
/// 返回规范化后的文本 (`0.50`, `100`, `1E3`), 不合法返回 `None`.
fn normalize_decimal(text: &str) -> Option<String> {
    let unsigned = text.strip_prefix('+').unwrap_or(text);

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
        None => (unsigned, None),
    };

    let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(integer) || !digits_only(fraction) {
        return None;
    }
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut normalized = if integer.is_empty() {
        "0".to_string()
    } else {
        integer.to_string()
    };
    if !fraction.is_empty() {
        normalized.push('.');
        normalized.push_str(fraction);
    }

    if let Some(exponent) = exponent {
        let exponent = exponent.strip_prefix('+').unwrap_or(exponent);
        if exponent.is_empty() || !digits_only(exponent) {
            return None;
        }
        normalized.push('E');
        normalized.push_str(exponent);
    }

    Some(normalized)
}

impl FromStr for ParsedAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_currency_amount(s)
    }
}

/// `date` 所在月份的第一天
pub fn month_key(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}
