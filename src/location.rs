use chrono::{DateTime, TimeZone};

#[cfg(feature = "app")]
use crate::models::Coordinates;
use crate::models::Settings;

#[cfg(feature = "app")]
const REVERSE_GEOCODE_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";
#[cfg(feature = "app")]
const LOOKUP_TIMEOUT_SECS: u64 = 5;
const DEFAULT_LANGUAGE: &str = "en";
pub const UNAVAILABLE: &str = "N/A";

const CITY_ABBREVIATIONS: &[(&str, &str)] = &[
    ("New York", "NYC"),
    ("Los Angeles", "LA"),
    ("San Francisco", "SF"),
    ("San Diego", "SD"),
    ("Washington", "DC"),
    ("Chicago", "CHI"),
    ("Boston", "BOS"),
    ("Miami", "MIA"),
    ("Seattle", "SEA"),
    ("Portland", "PDX"),
    ("Philadelphia", "PHL"),
    ("Houston", "HOU"),
    ("Dallas", "DAL"),
    ("Atlanta", "ATL"),
    ("Denver", "DEN"),
    ("Phoenix", "PHX"),
    ("Las Vegas", "LV"),
    ("Detroit", "DET"),
    ("Minneapolis", "MSP"),
    ("Istanbul", "IST"),
    ("Ankara", "ANK"),
    ("Izmir", "IZM"),
    ("London", "LON"),
    ("Paris", "PAR"),
    ("Berlin", "BER"),
    ("Rome", "ROM"),
    ("Madrid", "MAD"),
    ("Barcelona", "BCN"),
    ("Amsterdam", "AMS"),
    ("Vienna", "VIE"),
    ("Prague", "PRG"),
    ("Warsaw", "WAW"),
    ("Moscow", "MOW"),
    ("Tokyo", "TYO"),
    ("Seoul", "SEL"),
    ("Beijing", "BJS"),
    ("Shanghai", "SHA"),
    ("Hong Kong", "HKG"),
    ("Singapore", "SIN"),
    ("Sydney", "SYD"),
    ("Melbourne", "MEL"),
    ("Dubai", "DXB"),
    ("Cairo", "CAI"),
    ("Mumbai", "BOM"),
    ("Delhi", "DEL"),
    ("Bangkok", "BKK"),
    ("Jakarta", "JKT"),
    ("Manila", "MNL"),
    ("São Paulo", "SP"),
    ("Rio de Janeiro", "RIO"),
    ("Buenos Aires", "BA"),
    ("Mexico City", "MEX"),
    ("Toronto", "TOR"),
    ("Vancouver", "VAN"),
];

#[derive(Debug)]
pub enum LocationError {
    Unsupported,
    Timeout,
    Http(String),
    MissingCity,
}

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationError::Unsupported => write!(f, "built without network lookup"),
            LocationError::Timeout => write!(f, "reverse geocoding timed out"),
            LocationError::Http(message) => write!(f, "reverse geocoding failed: {message}"),
            LocationError::MissingCity => write!(f, "reverse geocoding returned no city"),
        }
    }
}

impl std::error::Error for LocationError {}

pub fn format_clock<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%b %-d, %-I:%M %p").to_string()
}

pub fn shorten_city_name(city: &str) -> String {
    let city = city.trim();
    if let Some((_, code)) = CITY_ABBREVIATIONS.iter().find(|(name, _)| *name == city) {
        return (*code).to_string();
    }
    if city.chars().count() <= 4 {
        return city.to_uppercase();
    }
    city.chars().take(3).collect::<String>().to_uppercase()
}

pub fn city_from_response(value: &serde_json::Value) -> Result<String, LocationError> {
    value
        .get("city")
        .and_then(|city| city.as_str())
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .map(shorten_city_name)
        .ok_or(LocationError::MissingCity)
}

pub fn locality_language(settings: &Settings, system_locale: Option<&str>) -> String {
    settings
        .locality_language
        .as_deref()
        .or(system_locale)
        .and_then(|tag| tag.split(['-', '_']).next())
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

pub fn header_line(clock: Option<String>, location: Option<&Result<String, LocationError>>) -> Option<String> {
    let location = location.map(|result| match result {
        Ok(code) => code.clone(),
        Err(_) => UNAVAILABLE.to_string(),
    });
    match (clock, location) {
        (Some(clock), Some(location)) => Some(format!("{clock} | {location}")),
        (Some(clock), None) => Some(clock),
        (None, Some(location)) => Some(location),
        (None, None) => None,
    }
}

#[cfg(feature = "app")]
pub async fn lookup_city(coordinates: Coordinates, language: &str) -> Result<String, LocationError> {
    use std::time::Duration;

    let client = reqwest::Client::builder()
        .build()
        .map_err(|err| LocationError::Http(format!("failed to build http client: {err}")))?;
    let request = client.get(REVERSE_GEOCODE_URL).query(&[
        ("latitude", coordinates.latitude.to_string()),
        ("longitude", coordinates.longitude.to_string()),
        ("localityLanguage", language.to_string()),
    ]);

    let fetch = async {
        let resp = request
            .send()
            .await
            .map_err(|err| LocationError::Http(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LocationError::Http(format!("http {status}")));
        }
        resp.json::<serde_json::Value>()
            .await
            .map_err(|err| LocationError::Http(format!("invalid json: {err}")))
    };

    let value = tokio::time::timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS), fetch)
        .await
        .map_err(|_| LocationError::Timeout)??;
    city_from_response(&value)
}

#[cfg(feature = "app")]
pub fn resolve_location(settings: &Settings) -> Option<Result<String, LocationError>> {
    let coordinates = settings.location?;
    let system_locale = sys_locale::get_locale();
    let language = locality_language(settings, system_locale.as_deref());
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => return Some(Err(LocationError::Http(err.to_string()))),
    };
    let result = runtime.block_on(lookup_city(coordinates, &language));
    if let Err(error) = &result {
        log::warn!("location lookup failed: {error}");
    }
    Some(result)
}

#[cfg(not(feature = "app"))]
pub fn resolve_location(settings: &Settings) -> Option<Result<String, LocationError>> {
    settings.location.map(|_| Err(LocationError::Unsupported))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn clock_uses_short_month_and_twelve_hour_time() {
        let afternoon = Utc.with_ymd_and_hms(2026, 10, 16, 15, 4, 9).unwrap();
        assert_eq!(format_clock(&afternoon), "Oct 16, 3:04 PM");

        let midnight = Utc.with_ymd_and_hms(2026, 1, 5, 0, 30, 0).unwrap();
        assert_eq!(format_clock(&midnight), "Jan 5, 12:30 AM");
    }

    #[test]
    fn clock_follows_the_given_time_zone() {
        let instant = Utc.with_ymd_and_hms(2026, 10, 16, 15, 4, 0).unwrap();
        let istanbul = instant.with_timezone(&chrono_tz::Europe::Istanbul);
        assert_eq!(format_clock(&istanbul), "Oct 16, 6:04 PM");
        let new_york = instant.with_timezone(&chrono_tz::America::New_York);
        assert_eq!(format_clock(&new_york), "Oct 16, 11:04 AM");
    }

    #[test]
    fn known_cities_use_their_abbreviation() {
        assert_eq!(shorten_city_name("New York"), "NYC");
        assert_eq!(shorten_city_name("São Paulo"), "SP");
        assert_eq!(shorten_city_name(" Istanbul "), "IST");
    }

    #[test]
    fn unknown_cities_are_shortened() {
        assert_eq!(shorten_city_name("Oslo"), "OSLO");
        assert_eq!(shorten_city_name("Nice"), "NICE");
        assert_eq!(shorten_city_name("Edinburgh"), "EDI");
        assert_eq!(shorten_city_name("Zürich"), "ZÜR");
    }

    #[test]
    fn city_is_read_from_response() {
        let value = serde_json::json!({ "city": "London", "countryName": "United Kingdom" });
        assert_eq!(city_from_response(&value).unwrap(), "LON");

        for value in [
            serde_json::json!({ "city": "" }),
            serde_json::json!({ "locality": "Somewhere" }),
            serde_json::json!({ "city": null }),
        ] {
            assert!(matches!(
                city_from_response(&value),
                Err(LocationError::MissingCity)
            ));
        }
    }

    #[test]
    fn locality_language_prefers_settings_then_locale() {
        let mut settings = Settings::default();
        assert_eq!(locality_language(&settings, None), "en");
        assert_eq!(locality_language(&settings, Some("tr-TR")), "tr");
        assert_eq!(locality_language(&settings, Some("de_DE")), "de");

        settings.locality_language = Some("FR".to_string());
        assert_eq!(locality_language(&settings, Some("tr-TR")), "fr");
    }

    #[test]
    fn header_line_marks_failed_lookup_as_unavailable() {
        let clock = Some("Oct 16, 3:04 PM".to_string());
        assert_eq!(
            header_line(clock.clone(), Some(&Ok("IST".to_string()))).as_deref(),
            Some("Oct 16, 3:04 PM | IST")
        );
        assert_eq!(
            header_line(clock.clone(), Some(&Err(LocationError::Timeout))).as_deref(),
            Some("Oct 16, 3:04 PM | N/A")
        );
        assert_eq!(header_line(clock, None).as_deref(), Some("Oct 16, 3:04 PM"));
        assert_eq!(header_line(None, None), None);
    }

    #[test]
    fn resolve_location_skips_lookup_without_coordinates() {
        assert!(resolve_location(&Settings::default()).is_none());
    }
}
