//! Date and time codecs, using the [`time`][::time] crate.
//!
//! Binary values count from the postgres epoch, `2000-01-01 00:00:00`, in days for `date`
//! and in microseconds otherwise. Text values are in ISO `DateStyle`.
use ::time::{
    Date, Duration, PrimitiveDateTime, Time, UtcDateTime, UtcOffset,
    format_description::BorrowedFormatItem,
    macros::format_description,
};

use super::{Codec, DecodeError, EncodeError, Kind, Parameter, Value, fixed, text, value};
use crate::postgres::{Oid, PgFormat, oid};

value! {
    Date => Date;
    Time => Time;
    PrimitiveDateTime => Timestamp;
    UtcDateTime => TimestampTz;
}

const PG_EPOCH: PrimitiveDateTime = {
    // source: `from_julian_day` docs
    let date = match Date::from_julian_day(2_451_545) {
        Ok(ok) => ok,
        Err(_) => panic!("postgres epoch is a valid date"),
    };
    PrimitiveDateTime::new(date, Time::MIDNIGHT)
};

const MICROS_PER_DAY: i64 = 86_400_000_000;

const DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

const TIME: &[BorrowedFormatItem<'_>] =
    format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]");

const TIMESTAMP: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");

fn micros(value: &[u8], kind: Kind) -> Result<Duration, DecodeError> {
    Ok(Duration::microseconds(i64::from_be_bytes(fixed(value, kind)?)))
}

fn out_of_range(kind: Kind) -> DecodeError {
    DecodeError::invalid(kind, "out of range")
}

fn parse_err(kind: Kind, value: &str, err: ::time::error::Parse) -> DecodeError {
    DecodeError::invalid(kind, format!("{value:?}, {err}"))
}

fn format_err(kind: Kind, err: ::time::error::Format) -> EncodeError {
    EncodeError::Invalid { kind, reason: err.to_string().into() }
}

fn decode_timestamp(value: &[u8], format: PgFormat, kind: Kind) -> Result<PrimitiveDateTime, DecodeError> {
    match format {
        PgFormat::Binary => PG_EPOCH
            .checked_add(micros(value, kind)?)
            .ok_or_else(|| out_of_range(kind)),
        PgFormat::Text => {
            let value = text(value, kind)?;
            PrimitiveDateTime::parse(value, TIMESTAMP).map_err(|err| parse_err(kind, value, err))
        }
    }
}

/// Split `2024-01-02 03:04:05+05:30` into timestamp and offset.
fn split_offset(value: &str) -> Option<(&str, UtcOffset)> {
    // date part contains `-`, offset always follows the time part
    let at = value.get(11..)?.rfind(['+', '-'])? + 11;
    let (timestamp, offset) = value.split_at(at);
    let negative = offset.starts_with('-');

    let mut parts = offset[1..].split(':').map(str::parse::<i8>);
    let hours = parts.next()?.ok()?;
    let minutes = parts.next().transpose().ok()?.unwrap_or(0);
    let seconds = parts.next().transpose().ok()?.unwrap_or(0);
    if parts.next().is_some() {
        return None;
    }

    let offset = match negative {
        true => UtcOffset::from_hms(-hours, -minutes, -seconds),
        false => UtcOffset::from_hms(hours, minutes, seconds),
    };
    Some((timestamp, offset.ok()?))
}

/// `date`
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

impl Codec for DateCodec {
    fn kind(&self) -> Kind {
        Kind::Date
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Date && oid == oid::DATE
    }

    fn decode(&self, value: &[u8], format: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        let date = match format {
            PgFormat::Binary => {
                let days = i32::from_be_bytes(fixed(value, Kind::Date)?);
                PG_EPOCH
                    .date()
                    .checked_add(Duration::days(days.into()))
                    .ok_or_else(|| out_of_range(Kind::Date))?
            }
            PgFormat::Text => {
                let value = text(value, Kind::Date)?;
                Date::parse(value, DATE).map_err(|err| parse_err(Kind::Date, value, err))?
            }
        };
        Ok(Value::Date(date))
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Date(date) => {
                let date = date.format(DATE).map_err(|err| format_err(Kind::Date, err))?;
                Ok(Parameter::new(PgFormat::Text, oid::DATE, date))
            }
            Value::Null(Kind::Date) => Ok(Parameter::null(PgFormat::Text, oid::DATE)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

/// `time`, without time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeCodec;

impl Codec for TimeCodec {
    fn kind(&self) -> Kind {
        Kind::Time
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Time && oid == oid::TIME
    }

    fn decode(&self, value: &[u8], format: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        let time = match format {
            PgFormat::Binary => {
                let micros = i64::from_be_bytes(fixed(value, Kind::Time)?);
                if !(0..MICROS_PER_DAY).contains(&micros) {
                    return Err(out_of_range(Kind::Time));
                }
                Time::from_hms_micro(
                    (micros / 3_600_000_000) as u8,
                    (micros / 60_000_000 % 60) as u8,
                    (micros / 1_000_000 % 60) as u8,
                    (micros % 1_000_000) as u32,
                )
                .map_err(|_| out_of_range(Kind::Time))?
            }
            PgFormat::Text => {
                let value = text(value, Kind::Time)?;
                Time::parse(value, TIME).map_err(|err| parse_err(Kind::Time, value, err))?
            }
        };
        Ok(Value::Time(time))
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Time(time) => {
                let time = time.format(TIME).map_err(|err| format_err(Kind::Time, err))?;
                Ok(Parameter::new(PgFormat::Text, oid::TIME, time))
            }
            Value::Null(Kind::Time) => Ok(Parameter::null(PgFormat::Text, oid::TIME)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

/// `timestamp`, without time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec;

impl Codec for TimestampCodec {
    fn kind(&self) -> Kind {
        Kind::Timestamp
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Timestamp && oid == oid::TIMESTAMP
    }

    fn decode(&self, value: &[u8], format: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        decode_timestamp(value, format, Kind::Timestamp).map(Value::Timestamp)
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Timestamp(datetime) => {
                let datetime = datetime
                    .format(TIMESTAMP)
                    .map_err(|err| format_err(Kind::Timestamp, err))?;
                Ok(Parameter::new(PgFormat::Text, oid::TIMESTAMP, datetime))
            }
            Value::Null(Kind::Timestamp) => Ok(Parameter::null(PgFormat::Text, oid::TIMESTAMP)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

/// `timestamptz`, decoded and encoded in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampTzCodec;

impl Codec for TimestampTzCodec {
    fn kind(&self) -> Kind {
        Kind::TimestampTz
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::TimestampTz && oid == oid::TIMESTAMPTZ
    }

    fn decode(&self, value: &[u8], format: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        const KIND: Kind = Kind::TimestampTz;

        let utc = match format {
            PgFormat::Binary => decode_timestamp(value, format, KIND)?,
            PgFormat::Text => {
                let value = text(value, KIND)?;
                let (timestamp, offset) = split_offset(value)
                    .ok_or_else(|| DecodeError::invalid(KIND, format!("{value:?}, invalid offset")))?;
                let datetime = PrimitiveDateTime::parse(timestamp, TIMESTAMP)
                    .map_err(|err| parse_err(KIND, value, err))?;
                // local time at `offset`, shifted back to UTC
                datetime
                    .checked_sub(Duration::seconds(offset.whole_seconds().into()))
                    .ok_or_else(|| out_of_range(KIND))?
            }
        };
        Ok(Value::TimestampTz(UtcDateTime::new(utc.date(), utc.time())))
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::TimestampTz(datetime) => {
                let mut datetime = datetime
                    .format(TIMESTAMP)
                    .map_err(|err| format_err(Kind::TimestampTz, err))?;
                datetime.push_str("+00");
                Ok(Parameter::new(PgFormat::Text, oid::TIMESTAMPTZ, datetime))
            }
            Value::Null(Kind::TimestampTz) => Ok(Parameter::null(PgFormat::Text, oid::TIMESTAMPTZ)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::Codecs;
    use ::time::Month;

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    fn decode<T: crate::codec::Decode>(value: &[u8], format: PgFormat, oid: Oid) -> T {
        Codecs::default().decode(Some(value), format, oid).unwrap()
    }

    fn roundtrip<T: crate::codec::Encode + crate::codec::Decode>(value: T) -> T {
        let codecs = Codecs::default();
        let param = codecs.encode(value).unwrap();
        codecs.decode(param.value.as_deref(), param.format, param.oid).unwrap()
    }

    #[test]
    fn date_formats() {
        assert_eq!(decode::<Date>(b"2024-02-29", PgFormat::Text, oid::DATE), date(2024, Month::February, 29));
        assert_eq!(decode::<Date>(&0i32.to_be_bytes(), PgFormat::Binary, oid::DATE), date(2000, Month::January, 1));
        assert_eq!(decode::<Date>(&(-1i32).to_be_bytes(), PgFormat::Binary, oid::DATE), date(1999, Month::December, 31));

        let leap = date(2024, Month::February, 29);
        assert_eq!(roundtrip(leap), leap);

        let err = Codecs::default().decode::<Date>(Some(&b"infinity"[..]), PgFormat::Text, oid::DATE);
        assert!(err.is_err());
        let err = Codecs::default().decode::<Date>(Some(&i32::MAX.to_be_bytes()[..]), PgFormat::Binary, oid::DATE);
        assert!(err.is_err());
    }

    #[test]
    fn time_formats() {
        let noon = Time::from_hms(12, 0, 0).unwrap();
        assert_eq!(decode::<Time>(b"12:00:00", PgFormat::Text, oid::TIME), noon);

        let precise = Time::from_hms_micro(23, 59, 59, 999_999).unwrap();
        assert_eq!(decode::<Time>(b"23:59:59.999999", PgFormat::Text, oid::TIME), precise);
        assert_eq!(decode::<Time>(&(MICROS_PER_DAY - 1).to_be_bytes(), PgFormat::Binary, oid::TIME), precise);
        assert_eq!(roundtrip(precise), precise);
        assert_eq!(roundtrip(Time::MIDNIGHT), Time::MIDNIGHT);

        let err = Codecs::default().decode::<Time>(Some(&MICROS_PER_DAY.to_be_bytes()[..]), PgFormat::Binary, oid::TIME);
        assert!(err.is_err());
    }

    #[test]
    fn timestamp_formats() {
        let expected = PrimitiveDateTime::new(
            date(2024, Month::January, 2),
            Time::from_hms_micro(3, 4, 5, 600_000).unwrap(),
        );
        assert_eq!(decode::<PrimitiveDateTime>(b"2024-01-02 03:04:05.6", PgFormat::Text, oid::TIMESTAMP), expected);
        assert_eq!(roundtrip(expected), expected);

        let whole = decode::<PrimitiveDateTime>(b"2024-01-02 03:04:05", PgFormat::Text, oid::TIMESTAMP);
        assert_eq!(whole.time(), Time::from_hms(3, 4, 5).unwrap());

        let epoch = decode::<PrimitiveDateTime>(&0i64.to_be_bytes(), PgFormat::Binary, oid::TIMESTAMP);
        assert_eq!(epoch, PG_EPOCH);

        let err = Codecs::default().decode::<PrimitiveDateTime>(Some(&i64::MAX.to_be_bytes()[..]), PgFormat::Binary, oid::TIMESTAMP);
        assert!(err.is_err());
    }

    #[test]
    fn timestamptz_offsets() {
        let expected = UtcDateTime::new(date(2024, Month::January, 1), Time::from_hms(22, 0, 0).unwrap());
        for input in [
            "2024-01-01 22:00:00+00",
            "2024-01-02 03:30:00+05:30",
            "2024-01-01 19:00:00-03",
        ] {
            let value = decode::<UtcDateTime>(input.as_bytes(), PgFormat::Text, oid::TIMESTAMPTZ);
            assert_eq!(value, expected, "{input}");
        }

        let micros = 1_000_000i64;
        let value = decode::<UtcDateTime>(&micros.to_be_bytes(), PgFormat::Binary, oid::TIMESTAMPTZ);
        assert_eq!(value.time(), Time::from_hms(0, 0, 1).unwrap());

        assert_eq!(roundtrip(expected), expected);

        let err = Codecs::default().decode::<UtcDateTime>(Some(&b"2024-01-01 22:00:00"[..]), PgFormat::Text, oid::TIMESTAMPTZ);
        assert!(err.is_err());
    }

    #[test]
    fn offset_parsing() {
        let (timestamp, offset) = split_offset("2024-01-01 00:00:00.5-09:30:15").unwrap();
        assert_eq!(timestamp, "2024-01-01 00:00:00.5");
        assert_eq!(offset.whole_seconds(), -(9 * 3600 + 30 * 60 + 15));
        assert!(split_offset("2024-01-01").is_none());
        assert!(split_offset("2024-01-01 00:00:00+ab").is_none());
    }
}
