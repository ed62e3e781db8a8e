use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use super::Evaluator;
use crate::error::{ArithmeticKind, EvalError, EvalResult};
use crate::rexpr::context::RemoteContext;
use crate::rexpr::expr::Expression;
use crate::schema::{DynamicValue, PrimitiveValue, Schema, SchemaAndValue, TimeUnit};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

fn overflow() -> EvalError {
    EvalError::Arithmetic(ArithmeticKind::Overflow)
}

fn instant_result(instant: DateTime<Utc>) -> SchemaAndValue {
    SchemaAndValue::new(
        Schema::INSTANT,
        DynamicValue::Primitive(PrimitiveValue::Instant(instant)),
    )
}

fn duration_result(duration: TimeDelta) -> SchemaAndValue {
    SchemaAndValue::new(
        Schema::DURATION,
        DynamicValue::Primitive(PrimitiveValue::Duration(duration)),
    )
}

fn long_pair_result(first: i64, second: i64) -> SchemaAndValue {
    SchemaAndValue::new(
        Schema::pair(Schema::LONG, Schema::LONG),
        DynamicValue::pair(DynamicValue::long(first), DynamicValue::long(second)),
    )
}

/// Build a delta from a total nanosecond count, normalizing the
/// fractional part into `0..10^9`.
fn delta_from_total_nanos(total: i128) -> EvalResult<TimeDelta> {
    let seconds = total.div_euclid(NANOS_PER_SECOND);
    let nanos = total.rem_euclid(NANOS_PER_SECOND) as u32;
    let seconds = i64::try_from(seconds).map_err(|_| overflow())?;
    TimeDelta::new(seconds, nanos).ok_or_else(overflow)
}

/// Floor-normalized `(seconds, nanos)` of a delta, with `0 <= nanos < 10^9`.
fn delta_to_longs(delta: TimeDelta) -> (i64, i64) {
    let mut seconds = delta.num_seconds();
    let mut nanos = i64::from(delta.subsec_nanos());
    if nanos < 0 {
        seconds -= 1;
        nanos += 1_000_000_000;
    }
    (seconds, nanos)
}

/// Parse an ISO-8601 duration of the `PnDTnHnMn.nS` family.
///
/// An optional leading sign applies to the whole duration; the seconds
/// component may carry up to nine fractional digits.
fn parse_iso_duration(input: &str) -> EvalResult<TimeDelta> {
    let parse_error = |msg: &str| EvalError::Parse(format!("invalid duration `{input}`: {msg}"));

    let trimmed = input.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let rest = rest
        .strip_prefix(['P', 'p'])
        .ok_or_else(|| parse_error("missing P designator"))?;

    let (date_part, time_part) = match rest.split_once(['T', 't']) {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    if date_part.is_empty() && time_part.map_or(true, str::is_empty) {
        return Err(parse_error("no components"));
    }

    let mut total: i128 = 0;

    if !date_part.is_empty() {
        let days = date_part
            .strip_suffix(['D', 'd'])
            .and_then(|digits| digits.parse::<i64>().ok())
            .ok_or_else(|| parse_error("malformed date part"))?;
        total += i128::from(days) * 86_400 * NANOS_PER_SECOND;
    }

    if let Some(time_part) = time_part {
        let mut chars = time_part.char_indices().peekable();
        let mut seen_any = false;
        while let Some(&(start, _)) = chars.peek() {
            let mut end = start;
            while let Some(&(idx, c)) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    end = idx + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let number = &time_part[start..end];
            let (_, designator) = chars
                .next()
                .ok_or_else(|| parse_error("number without unit designator"))?;
            seen_any = true;
            match designator.to_ascii_uppercase() {
                'H' => {
                    let hours = number
                        .parse::<i64>()
                        .map_err(|_| parse_error("malformed hours"))?;
                    total += i128::from(hours) * 3_600 * NANOS_PER_SECOND;
                }
                'M' => {
                    let minutes = number
                        .parse::<i64>()
                        .map_err(|_| parse_error("malformed minutes"))?;
                    total += i128::from(minutes) * 60 * NANOS_PER_SECOND;
                }
                'S' => {
                    let (whole, fraction) = match number.split_once('.') {
                        Some((whole, fraction)) => (whole, fraction),
                        None => (number, ""),
                    };
                    let seconds = whole
                        .parse::<i64>()
                        .map_err(|_| parse_error("malformed seconds"))?;
                    total += i128::from(seconds) * NANOS_PER_SECOND;
                    if !fraction.is_empty() {
                        if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                            return Err(parse_error("malformed fractional seconds"));
                        }
                        let mut nanos: i128 = fraction.parse::<i64>().map_or(0, i128::from);
                        nanos *= 10i128.pow(9 - fraction.len() as u32);
                        total += nanos;
                    }
                }
                _ => return Err(parse_error("unknown unit designator")),
            }
        }
        if !seen_any {
            return Err(parse_error("empty time part"));
        }
    }

    if negative {
        total = -total;
    }
    delta_from_total_nanos(total)
}

impl Evaluator {
    fn eval_long(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<i64> {
        match self.eval_primitive(expr, ctx, depth)? {
            PrimitiveValue::Long(n) => Ok(n),
            other => Err(EvalError::type_mismatch("Long", other.standard_type())),
        }
    }

    fn eval_string(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<String> {
        match self.eval_primitive(expr, ctx, depth)? {
            PrimitiveValue::String(s) => Ok(s),
            other => Err(EvalError::type_mismatch("String", other.standard_type())),
        }
    }

    fn eval_instant_value(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<DateTime<Utc>> {
        match self.eval_primitive(expr, ctx, depth)? {
            PrimitiveValue::Instant(i) => Ok(i),
            other => Err(EvalError::type_mismatch("Instant", other.standard_type())),
        }
    }

    fn eval_duration_value(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<TimeDelta> {
        match self.eval_primitive(expr, ctx, depth)? {
            PrimitiveValue::Duration(d) => Ok(d),
            other => Err(EvalError::type_mismatch("Duration", other.standard_type())),
        }
    }

    fn eval_time_unit(
        &self,
        expr: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<TimeUnit> {
        match self.eval_primitive(expr, ctx, depth)? {
            PrimitiveValue::TimeUnit(u) => Ok(u),
            other => Err(EvalError::type_mismatch("TimeUnit", other.standard_type())),
        }
    }

    pub(super) fn eval_instant_from_long(
        &self,
        seconds: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let seconds = self.eval_long(seconds, ctx, depth)?;
        DateTime::from_timestamp(seconds, 0)
            .map(instant_result)
            .ok_or_else(overflow)
    }

    pub(super) fn eval_instant_from_longs(
        &self,
        seconds: &Expression,
        nanos: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let seconds = self.eval_long(seconds, ctx, depth)?;
        let nanos = self.eval_long(nanos, ctx, depth)?;
        // Nano adjustment outside 0..10^9 spills into the seconds.
        let spill = nanos.div_euclid(1_000_000_000);
        let nanos = nanos.rem_euclid(1_000_000_000) as u32;
        let seconds = seconds.checked_add(spill).ok_or_else(overflow)?;
        DateTime::from_timestamp(seconds, nanos)
            .map(instant_result)
            .ok_or_else(overflow)
    }

    pub(super) fn eval_instant_from_milli(
        &self,
        millis: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let millis = self.eval_long(millis, ctx, depth)?;
        DateTime::from_timestamp_millis(millis)
            .map(instant_result)
            .ok_or_else(overflow)
    }

    pub(super) fn eval_instant_from_string(
        &self,
        value: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let text = self.eval_string(value, ctx, depth)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|parsed| instant_result(parsed.with_timezone(&Utc)))
            .map_err(|e| EvalError::Parse(format!("invalid instant `{text}`: {e}")))
    }

    pub(super) fn eval_instant_to_tuple(
        &self,
        instant: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let instant = self.eval_instant_value(instant, ctx, depth)?;
        Ok(long_pair_result(
            instant.timestamp(),
            i64::from(instant.timestamp_subsec_nanos()),
        ))
    }

    pub(super) fn eval_instant_shift(
        &self,
        instant: &Expression,
        duration: &Expression,
        forward: bool,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let instant = self.eval_instant_value(instant, ctx, depth)?;
        let duration = self.eval_duration_value(duration, ctx, depth)?;
        let shifted = if forward {
            instant.checked_add_signed(duration)
        } else {
            instant.checked_sub_signed(duration)
        };
        shifted.map(instant_result).ok_or_else(overflow)
    }

    pub(super) fn eval_instant_truncate(
        &self,
        instant: &Expression,
        unit: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let instant = self.eval_instant_value(instant, ctx, depth)?;
        let unit = self.eval_time_unit(unit, ctx, depth)?;
        let delta = unit.exact_delta().ok_or_else(|| {
            EvalError::EvaluationFailed(format!(
                "cannot truncate to estimated unit {unit:?}"
            ))
        })?;
        instant
            .duration_trunc(delta)
            .map(instant_result)
            .map_err(|e| EvalError::EvaluationFailed(format!("truncation failed: {e}")))
    }

    pub(super) fn eval_duration_from_string(
        &self,
        value: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let text = self.eval_string(value, ctx, depth)?;
        parse_iso_duration(&text).map(duration_result)
    }

    pub(super) fn eval_duration_between(
        &self,
        start: &Expression,
        end: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let start = self.eval_instant_value(start, ctx, depth)?;
        let end = self.eval_instant_value(end, ctx, depth)?;
        Ok(duration_result(end.signed_duration_since(start)))
    }

    /// Decimal seconds split into `(seconds, nanos)` at nanosecond
    /// precision.
    pub(super) fn eval_duration_from_big_decimal(
        &self,
        seconds: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let decimal = match self.eval_primitive(seconds, ctx, depth)? {
            PrimitiveValue::BigDecimal(d) => d,
            other => return Err(EvalError::type_mismatch("BigDecimal", other.standard_type())),
        };
        let total = decimal
            .checked_mul(Decimal::from(1_000_000_000u64))
            .ok_or_else(overflow)?
            .trunc()
            .to_i128()
            .ok_or_else(overflow)?;
        delta_from_total_nanos(total).map(duration_result)
    }

    pub(super) fn eval_duration_from_long(
        &self,
        seconds: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let seconds = self.eval_long(seconds, ctx, depth)?;
        TimeDelta::try_seconds(seconds)
            .map(duration_result)
            .ok_or_else(overflow)
    }

    pub(super) fn eval_duration_from_longs(
        &self,
        seconds: &Expression,
        nano_adjustment: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let seconds = self.eval_long(seconds, ctx, depth)?;
        let nano_adjustment = self.eval_long(nano_adjustment, ctx, depth)?;
        let total = i128::from(seconds) * NANOS_PER_SECOND + i128::from(nano_adjustment);
        delta_from_total_nanos(total).map(duration_result)
    }

    pub(super) fn eval_duration_from_amount(
        &self,
        amount: &Expression,
        unit: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let amount = self.eval_long(amount, ctx, depth)?;
        let unit = self.eval_time_unit(unit, ctx, depth)?;
        let unit_delta = unit.exact_delta().ok_or_else(|| {
            EvalError::EvaluationFailed(format!(
                "cannot build a duration from estimated unit {unit:?}"
            ))
        })?;
        let unit_nanos = unit_delta.num_nanoseconds().ok_or_else(overflow)?;
        let total = i128::from(unit_nanos) * i128::from(amount);
        delta_from_total_nanos(total).map(duration_result)
    }

    pub(super) fn eval_duration_to_longs(
        &self,
        duration: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let duration = self.eval_duration_value(duration, ctx, depth)?;
        let (seconds, nanos) = delta_to_longs(duration);
        Ok(long_pair_result(seconds, nanos))
    }

    pub(super) fn eval_duration_to_long(
        &self,
        duration: &Expression,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let duration = self.eval_duration_value(duration, ctx, depth)?;
        let (seconds, _) = delta_to_longs(duration);
        Ok(SchemaAndValue::new(
            Schema::LONG,
            DynamicValue::long(seconds),
        ))
    }

    pub(super) fn eval_duration_combine(
        &self,
        left: &Expression,
        right: &Expression,
        add: bool,
        ctx: &mut dyn RemoteContext,
        depth: usize,
    ) -> EvalResult<SchemaAndValue> {
        let lhs = self.eval_duration_value(left, ctx, depth)?;
        let rhs = self.eval_duration_value(right, ctx, depth)?;
        let combined = if add {
            lhs.checked_add(&rhs)
        } else {
            lhs.checked_sub(&rhs)
        };
        combined.map(duration_result).ok_or_else(overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_durations() {
        assert_eq!(parse_iso_duration("PT60S").unwrap(), TimeDelta::seconds(60));
        assert_eq!(parse_iso_duration("PT1H30M").unwrap(), TimeDelta::minutes(90));
        assert_eq!(
            parse_iso_duration("P2DT3H4M5S").unwrap(),
            TimeDelta::seconds(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5)
        );
    }

    #[test]
    fn parses_fractional_seconds() {
        assert_eq!(
            parse_iso_duration("PT0.5S").unwrap(),
            TimeDelta::milliseconds(500)
        );
        assert_eq!(
            parse_iso_duration("PT1.000000001S").unwrap(),
            TimeDelta::new(1, 1).unwrap()
        );
    }

    #[test]
    fn parses_negative_durations() {
        assert_eq!(parse_iso_duration("-PT30S").unwrap(), TimeDelta::seconds(-30));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_iso_duration("").is_err());
        assert!(parse_iso_duration("P").is_err());
        assert!(parse_iso_duration("60S").is_err());
        assert!(parse_iso_duration("PT60X").is_err());
        assert!(parse_iso_duration("PT1.0000000001S").is_err());
    }

    #[test]
    fn floor_normalizes_negative_deltas() {
        let delta = TimeDelta::new(-1, 500_000_000).unwrap();
        let (seconds, nanos) = delta_to_longs(delta);
        assert_eq!(seconds * 1_000_000_000 + nanos, -500_000_000);
        assert!((0..1_000_000_000).contains(&nanos));
    }
}
