//! WMO weather interpretation codes.
//!
//! Open-Meteo reports conditions as a numeric WMO code.  The widgets only ever
//! need a short English label for it.

/// Returns a short label for a WMO weather code, or `"Unknown"`.
pub fn weather_description(code: u16) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 | 48 => "Foggy",
        51 => "Light Drizzle",
        53 => "Drizzle",
        55 => "Heavy Drizzle",
        61 => "Light Rain",
        63 => "Rain",
        65 => "Heavy Rain",
        71 => "Light Snow",
        73 => "Snow",
        75 => "Heavy Snow",
        77 => "Snow Grains",
        80 => "Light Showers",
        81 => "Showers",
        82 => "Heavy Showers",
        85 => "Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm + Hail",
        99 => "Heavy Thunderstorm",
        _ => "Unknown",
    }
}
