use super::LLPoint;

/// Largest extent, in square degrees, the public Overpass servers answer for.
pub const MAX_AREA_SQ_DEGREES: f64 = 1.7;

/// A checked Bounding Box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LLBBox {
    /// The "bottom-left" vertex of the rectangle
    min: LLPoint,

    /// The "top-right" vertex of the rectangle
    max: LLPoint,
}

impl LLBBox {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Result<Self, String> {
        let vals_in_order = min_lng < max_lng && min_lat < max_lat;

        if !vals_in_order {
            return Err(format!(
                "Invalid BBox ({min_lat},{min_lng},{max_lat},{max_lng}): minimum must be below maximum"
            ));
        }

        let min = LLPoint::new(min_lat, min_lng)?;
        let max = LLPoint::new(max_lat, max_lng)?;

        Ok(Self { min, max })
    }

    /// Parses `min_lat,min_lng,max_lat,max_lng`, separated by commas or spaces.
    pub fn from_str(s: &str) -> Result<Self, String> {
        let values: Vec<f64> = s
            .split([',', ' '])
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("Invalid BBox value '{part}': {e}"))
            })
            .collect::<Result<_, _>>()?;

        let [min_lat, min_lng, max_lat, max_lng]: [f64; 4] = values
            .try_into()
            .map_err(|v: Vec<f64>| format!("Expected 4 BBox values, got {}", v.len()))?;

        Self::new(min_lat, min_lng, max_lat, max_lng)
    }

    pub fn min(&self) -> LLPoint {
        self.min
    }

    pub fn max(&self) -> LLPoint {
        self.max
    }

    /// Planar extent in square degrees.
    pub fn area_sq_degrees(&self) -> f64 {
        (self.max.lat() - self.min.lat()) * (self.max.lng() - self.min.lng())
    }

    /// Overpass QL bounding-box filter, `(south,west,north,east)`.
    pub fn to_overpass(&self) -> String {
        format!(
            "({},{},{},{})",
            self.min.lat(),
            self.min.lng(),
            self.max.lat(),
            self.max.lng()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_input() {
        assert!(LLBBox::new(0., 0., 1., 1.).is_ok());

        assert!(LLBBox::new(1., 2., 3., 4.).is_ok());

        // Munich, Germany
        assert!(LLBBox::new(48.13, 11.56, 48.15, 11.59).is_ok());

        // Santa Monica, Los Angeles, US
        assert!(LLBBox::new(34.00348, -118.51226, 34.02033, -118.47600).is_ok());

        // Sydney Opera House, Sydney, Australia
        assert!(LLBBox::new(-33.861035, 151.204137, -33.852597, 151.222268).is_ok());
    }

    #[test]
    fn test_from_str_commas() {
        let bbox = LLBBox::from_str("48.13,11.56,48.15,11.59").unwrap();
        assert_eq!(bbox, LLBBox::new(48.13, 11.56, 48.15, 11.59).unwrap());
    }

    #[test]
    fn test_from_str_spaces() {
        let bbox = LLBBox::from_str("48.13 11.56 48.15 11.59").unwrap();
        assert_eq!(bbox, LLBBox::new(48.13, 11.56, 48.15, 11.59).unwrap());
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!(LLBBox::from_str("48.13,11.56,48.15").is_err());
        assert!(LLBBox::from_str("a,b,c,d").is_err());
        assert!(LLBBox::from_str("").is_err());
    }

    #[test]
    fn test_out_of_order() {
        assert!(LLBBox::new(0., 0., 0., 0.).is_err());
        assert!(LLBBox::new(1., 0., 0., 1.).is_err());
        assert!(LLBBox::new(0., 1., 1., 0.).is_err());
    }

    #[test]
    fn test_overpass_filter() {
        let bbox = LLBBox::new(48.13, 11.56, 48.15, 11.59).unwrap();
        assert_eq!(bbox.to_overpass(), "(48.13,11.56,48.15,11.59)");
    }

    #[test]
    fn test_area() {
        let bbox = LLBBox::new(0., 0., 1., 2.).unwrap();
        assert_eq!(bbox.area_sq_degrees(), 2.0);
    }
}
