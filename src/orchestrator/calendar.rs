use time::{macros::format_description, Date, Duration, OffsetDateTime, Weekday};

/// Weekday labels in plan order, Monday first.
pub const WEEK_DAYS: [(Weekday, &str); 7] = [
    (Weekday::Monday, "Segunda-feira"),
    (Weekday::Tuesday, "Terça-feira"),
    (Weekday::Wednesday, "Quarta-feira"),
    (Weekday::Thursday, "Quinta-feira"),
    (Weekday::Friday, "Sexta-feira"),
    (Weekday::Saturday, "Sábado"),
    (Weekday::Sunday, "Domingo"),
];

pub fn label(day: Weekday) -> &'static str {
    WEEK_DAYS
        .iter()
        .find(|(d, _)| *d == day)
        .map(|(_, l)| *l)
        .unwrap_or_default()
}

/// Case-insensitive lookup of a weekday label.
pub fn weekday_for_label(name: &str) -> Option<Weekday> {
    let lower = name.trim().to_lowercase();
    WEEK_DAYS
        .iter()
        .find(|(_, l)| l.to_lowercase() == lower)
        .map(|(d, _)| *d)
}

/// Date of `day` inside the Sunday-based week containing `today`.
///
/// Days earlier in the week than `today` land in the past.
pub fn target_date(today: Date, day: Weekday) -> Date {
    let diff = day.number_days_from_sunday() as i64 - today.weekday().number_days_from_sunday() as i64;
    today + Duration::days(diff)
}

/// `YYYY-MM-DD`, the daily document key.
pub fn date_key(date: Date) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    date.format(&fmt)
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}

pub fn parse_date_key(key: &str) -> Option<Date> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(key, &fmt).ok()
}

/// Source of "today" for a run.
pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Device-local calendar date, UTC when the local offset cannot be determined.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

/// Always returns the same date.
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
