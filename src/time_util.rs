use chrono::{TimeZone, Utc};

/// 毫秒时间戳 -> "YYYY-MM-DD HH:MM:SS" (UTC)
pub fn mill_time_to_datetime(timestamp_ms: i64) -> anyhow::Result<String> {
    match Utc.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(datetime) => {
            Ok(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        chrono::LocalResult::None => Err(anyhow::anyhow!("Invalid timestamp: None")),
        chrono::LocalResult::Ambiguous(_, _) => Err(anyhow::anyhow!("Invalid timestamp: Ambiguous")),
    }
}

/// 毫秒时间戳 -> "YYYY-MM-DD"，无效时间戳返回 "-"
pub fn mill_time_to_date(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(datetime) => datetime.format("%Y-%m-%d").to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch_millis() {
        assert_eq!(
            mill_time_to_datetime(1_700_000_000_000).unwrap(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(mill_time_to_date(0), "1970-01-01");
    }
}
