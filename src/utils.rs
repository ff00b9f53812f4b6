use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serializer;

pub fn serialize_date<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = DateTime::<Utc>::from_utc(*date, Utc).to_rfc3339_opts(SecondsFormat::Millis, true);
    serializer.serialize_str(&s)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json;

    #[derive(Serialize)]
    struct Joined {
        #[serde(serialize_with = "::utils::serialize_date")]
        date_joined: ::chrono::NaiveDateTime,
    }

    #[test]
    fn dates_render_as_rfc3339_utc() {
        let joined = Joined {
            date_joined: NaiveDate::from_ymd_opt(2023, 6, 1)
                .unwrap()
                .and_hms_opt(12, 30, 45)
                .unwrap(),
        };
        let value = serde_json::to_value(&joined).unwrap();
        assert_eq!(value["date_joined"], "2023-06-01T12:30:45.000Z");
    }
}
