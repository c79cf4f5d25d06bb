//! The fixed topic table published by the sensor device.

use crate::data::Metric;

/// Temperature readings in °C.
pub const TOPIC_TEMPERATURE: &str = "esp32/sensor/temperatura";
/// Relative humidity readings in %.
pub const TOPIC_HUMIDITY: &str = "esp32/sensor/umidade";
/// Raw analog sound level.
pub const TOPIC_SOUND: &str = "esp32/sensor/som";
/// Human-readable alert messages.
pub const TOPIC_ALERT: &str = "esp32/alertas";
/// Wildcard covering every sensor topic (used by the alarm publisher).
pub const TOPIC_SENSOR_WILDCARD: &str = "esp32/sensor/#";

/// All topics the dashboard subscribes to.
pub const DASHBOARD_TOPICS: [&str; 4] = [TOPIC_TEMPERATURE, TOPIC_HUMIDITY, TOPIC_SOUND, TOPIC_ALERT];

/// Where an inbound message on a topic should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A numeric reading for one of the sample windows.
    Sample(Metric),
    /// The alert channel.
    Alert,
    /// Not a topic we care about.
    Ignored,
}

/// Map a topic to its route.
pub fn route(topic: &str) -> Route {
    match topic {
        TOPIC_ALERT => Route::Alert,
        other => Metric::from_topic(other).map_or(Route::Ignored, Route::Sample),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_sensor_topics() {
        assert_eq!(route(TOPIC_TEMPERATURE), Route::Sample(Metric::Temperature));
        assert_eq!(route(TOPIC_HUMIDITY), Route::Sample(Metric::Humidity));
        assert_eq!(route(TOPIC_SOUND), Route::Sample(Metric::Sound));
    }

    #[test]
    fn test_route_alert_and_unknown() {
        assert_eq!(route(TOPIC_ALERT), Route::Alert);
        assert_eq!(route("esp32/sensor/pressure"), Route::Ignored);
        assert_eq!(route(""), Route::Ignored);
    }
}
