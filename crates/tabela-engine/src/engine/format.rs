use rhai::Dynamic;

use super::EngineValue;

/// Convert a Rhai result into an engine value.
pub fn dynamic_to_value(value: &Dynamic) -> EngineValue {
    if value.is_unit() {
        EngineValue::Empty
    } else if let Ok(n) = value.as_float() {
        EngineValue::Number(n)
    } else if let Ok(n) = value.as_int() {
        EngineValue::Number(n as f64)
    } else if let Ok(b) = value.as_bool() {
        EngineValue::Bool(b)
    } else if let Ok(s) = value.clone().into_string() {
        EngineValue::Text(s)
    } else {
        EngineValue::Text(value.to_string())
    }
}

/// Format a number for display.
///
/// Integral values print without a fractional part; everything else uses the
/// shortest representation that round-trips.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NUM!".to_string()
    } else if n.is_infinite() {
        "#NUM!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_integral_and_fractional() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "#NUM!");
    }

    #[test]
    fn test_dynamic_to_value_covers_primitives() {
        assert_eq!(dynamic_to_value(&Dynamic::UNIT), EngineValue::Empty);
        assert_eq!(dynamic_to_value(&Dynamic::from(2_i64)), EngineValue::Number(2.0));
        assert_eq!(dynamic_to_value(&Dynamic::from(true)), EngineValue::Bool(true));
        assert_eq!(
            dynamic_to_value(&Dynamic::from("hi".to_string())),
            EngineValue::Text("hi".to_string())
        );
    }
}
