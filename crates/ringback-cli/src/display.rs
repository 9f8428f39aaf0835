use ringback_core::Timestamp;
use time::macros::format_description;

pub fn fmt_ts(ts: Timestamp) -> String {
    ts.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| ts.to_string())
}

pub fn pct(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}%", r * 100.0),
        None => "n/a".to_string(),
    }
}
