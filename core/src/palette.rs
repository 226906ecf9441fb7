// Named colour palettes used by the chart specifications
//
// Hex values match Plotly's built-in `qualitative.Plotly`, `sequential.Plasma`
// and `cyclical.IceFire` scales.

/// Default discrete colour sequence
pub const PLOTLY: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Marker symbols handed out to categories, in order
pub const SYMBOLS: [&str; 8] = [
    "circle", "diamond", "square", "x", "cross", "pentagon", "star", "hexagram",
];

pub const PLASMA: [&str; 10] = [
    "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a",
    "#fdca26", "#f0f921",
];

pub const ICE_FIRE: [&str; 17] = [
    "#000000", "#001f4d", "#003786", "#0e58a8", "#217eb8", "#30a4ca", "#54c8df", "#9be4ef",
    "#e1e9d1", "#f3d573", "#e7b000", "#da8200", "#c65400", "#ac2301", "#820000", "#4c0000",
    "#000000",
];

/// Plasma, brightest first
pub fn plasma_r() -> Vec<String> {
    reversed(&PLASMA)
}

pub fn ice_fire() -> Vec<String> {
    ICE_FIRE.iter().map(|c| c.to_string()).collect()
}

fn reversed(colors: &[&str]) -> Vec<String> {
    colors.iter().rev().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plasma_r_reverses() {
        let r = plasma_r();
        assert_eq!(r.len(), PLASMA.len());
        assert_eq!(r.first().map(String::as_str), Some("#f0f921"));
        assert_eq!(r.last().map(String::as_str), Some("#0d0887"));
    }

    #[test]
    fn test_symbols_are_distinct() {
        for (i, a) in SYMBOLS.iter().enumerate() {
            assert!(!SYMBOLS[i + 1..].contains(a), "{a} repeated");
        }
    }

    #[test]
    fn test_ice_fire_is_cyclical() {
        let scale = ice_fire();
        assert_eq!(scale.first(), scale.last());
    }
}
