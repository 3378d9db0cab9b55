use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_args, schema_of, Tool};

// city, temperature, condition, humidity
const MOCK_WEATHER: &[(&str, &str, &str, &str)] = &[
    ("seattle", "52°F", "Rainy", "85%"),
    ("new york", "45°F", "Cloudy", "60%"),
    ("san francisco", "58°F", "Foggy", "75%"),
    ("los angeles", "72°F", "Sunny", "40%"),
    ("austin", "78°F", "Sunny", "55%"),
    ("chicago", "38°F", "Windy", "65%"),
];

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WeatherParams {
    /// City name to get weather for
    pub city: String,
}

pub struct Weather;

#[async_trait]
impl Tool for Weather {
    fn name(&self) -> &'static str {
        "get_weather"
    }

    fn description(&self) -> &'static str {
        "Get current weather for a city"
    }

    fn parameters(&self) -> Value {
        schema_of::<WeatherParams>()
    }

    async fn invoke(&self, args: Value) -> anyhow::Result<String> {
        let params: WeatherParams = parse_args(args)?;
        Ok(report(&params.city))
    }
}

fn report(city: &str) -> String {
    let needle = city.to_lowercase();
    match MOCK_WEATHER.iter().find(|(name, ..)| *name == needle) {
        Some((_, temp, condition, humidity)) => format!(
            "Weather in {}: {}, {}, Humidity: {}",
            city, temp, condition, humidity
        ),
        None => format!("Weather data not available for {}", city),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_known_city_is_case_insensitive() {
        let out = Weather.invoke(json!({"city": "Seattle"})).await.unwrap();
        assert_eq!(out, "Weather in Seattle: 52°F, Rainy, Humidity: 85%");
    }

    #[test]
    fn test_unknown_city() {
        assert_eq!(report("Paris"), "Weather data not available for Paris");
    }
}
