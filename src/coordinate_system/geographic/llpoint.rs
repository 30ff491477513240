use crate::geometry::Coordinate;

/// Bounds-checked longitude and latitude.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LLPoint {
    lat: f64,
    lng: f64,
}

impl LLPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(format!("Coordinate ({lat}, {lng}) is not finite"));
        }

        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("Latitude {lat} not in range -90.0..=90.0"));
        }

        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!("Longitude {lng} not in range -180.0..=180.0"));
        }

        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Planar coordinate with `x` = longitude and `y` = latitude.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            x: self.lng,
            y: self.lat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_input() {
        assert!(LLPoint::new(0., 0.).is_ok());

        // latitude extremes
        assert!(LLPoint::new(-90.0, 0.).is_ok());
        assert!(LLPoint::new(90.0, 0.).is_ok());

        // longitude extremes
        assert!(LLPoint::new(0., -180.0).is_ok());
        assert!(LLPoint::new(0., 180.0).is_ok());
    }

    #[test]
    fn test_out_of_bounds() {
        // latitude out-of-bounds
        assert!(LLPoint::new(-91., 0.).is_err());
        assert!(LLPoint::new(91., 0.).is_err());

        // longitude out-of-bounds
        assert!(LLPoint::new(0., -181.).is_err());
        assert!(LLPoint::new(0., 181.).is_err());
    }

    #[test]
    fn test_not_finite() {
        assert!(LLPoint::new(f64::NAN, 0.).is_err());
        assert!(LLPoint::new(0., f64::INFINITY).is_err());
    }

    #[test]
    fn test_coordinate_is_lon_lat() {
        let point = LLPoint::new(52.5, 13.4).unwrap();
        let coordinate = point.coordinate();
        assert_eq!(coordinate.x, 13.4);
        assert_eq!(coordinate.y, 52.5);
    }
}
