//! Vertical-speed coloring: two hue gradients, one for climb and one for sink.

use formats::RampConfig;

/// Hue gradient at fixed saturation and value over a scalar domain.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HueRamp {
    domain: [f64; 2],
    hues: [f64; 2],
    saturation: f64,
    value: f64,
    table_size: Option<u32>,
}

impl HueRamp {
    /// `hues[0]` at `domain[0]`, `hues[1]` at `domain[1]`; hues in turns.
    pub fn new(domain: [f64; 2], hues: [f64; 2]) -> Self {
        Self {
            domain,
            hues,
            saturation: 1.0,
            value: 1.0,
            table_size: None,
        }
    }

    pub fn with_saturation_value(mut self, saturation: f64, value: f64) -> Self {
        self.saturation = saturation;
        self.value = value;
        self
    }

    /// Sample the gradient into `n` discrete entries instead of interpolating.
    pub fn with_table_size(mut self, table_size: Option<u32>) -> Self {
        self.table_size = table_size;
        self
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    /// A domain without positive width maps every value to the first hue.
    pub fn is_degenerate(&self) -> bool {
        !(self.domain[1] - self.domain[0] > 0.0)
    }

    fn position(&self, value: f64) -> f64 {
        if self.is_degenerate() || value.is_nan() {
            return 0.0;
        }
        ((value - self.domain[0]) / (self.domain[1] - self.domain[0])).clamp(0.0, 1.0)
    }

    pub fn hue_at(&self, value: f64) -> f64 {
        let [h0, h1] = self.hues;
        let t = self.position(value);
        match self.table_size {
            None => h0 + (h1 - h0) * t,
            Some(n) if n > 1 => {
                let index = ((t * n as f64).floor() as u32).min(n - 1);
                h0 + (h1 - h0) * index as f64 / (n - 1) as f64
            }
            Some(_) => h0,
        }
    }

    pub fn color(&self, value: f64) -> [u8; 3] {
        let rgb = hsv_to_rgb(self.hue_at(value), self.saturation, self.value);
        rgb.map(to_channel)
    }
}

/// Climb and sink gradients built from one trajectory's speed extrema.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorRamp {
    ascending: HueRamp,
    descending: HueRamp,
}

impl ColorRamp {
    pub fn from_config(min_speed: f64, max_speed: f64, config: &RampConfig) -> Self {
        let ramp = |domain, hues| {
            HueRamp::new(domain, hues)
                .with_saturation_value(config.saturation, config.value)
                .with_table_size(config.table_size)
        };
        Self {
            ascending: ramp([0.0, max_speed], config.ascending_hues),
            descending: ramp([min_speed, 0.0], config.descending_hues),
        }
    }

    pub fn ascending(&self) -> &HueRamp {
        &self.ascending
    }

    pub fn descending(&self) -> &HueRamp {
        &self.descending
    }

    /// Color of one sample. `None` marks the first sample, which has no
    /// speed and shares the zero color of the sink gradient.
    pub fn color_for(&self, speed: Option<f64>) -> [u8; 3] {
        match speed {
            None => self.descending.color(0.0),
            Some(s) if s > 0.0 => self.ascending.color(s),
            Some(s) => self.descending.color(s),
        }
    }

    pub fn colors_for(&self, speeds: &[Option<f64>]) -> Vec<[u8; 3]> {
        speeds.iter().map(|s| self.color_for(*s)).collect()
    }
}

/// Gradients with the default hues: yellow to red when climbing, cyan to
/// green when sinking.
pub fn build_ramps(min_speed: f64, max_speed: f64) -> ColorRamp {
    ColorRamp::from_config(min_speed, max_speed, &RampConfig::default())
}

pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> [f64; 3] {
    let h = hue.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * f);
    let t = value * (1.0 - saturation * (1.0 - f));
    match sector as u32 % 6 {
        0 => [value, t, p],
        1 => [q, value, p],
        2 => [p, value, t],
        3 => [p, q, value],
        4 => [t, p, value],
        _ => [value, p, q],
    }
}

fn to_channel(c: f64) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::{ColorRamp, HueRamp, build_ramps, hsv_to_rgb};
    use formats::RampConfig;
    use pretty_assertions::assert_eq;

    const YELLOW: [u8; 3] = [255, 255, 0];
    const RED: [u8; 3] = [255, 0, 0];
    const CYAN: [u8; 3] = [0, 255, 255];
    const GREEN: [u8; 3] = [0, 255, 0];

    #[test]
    fn primary_hues() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [1.0, 0.0, 0.0]);
        assert_eq!(hsv_to_rgb(1.0 / 6.0, 1.0, 1.0), [1.0, 1.0, 0.0]);
        assert_eq!(hsv_to_rgb(2.0 / 6.0, 1.0, 1.0), [0.0, 1.0, 0.0]);
        assert_eq!(hsv_to_rgb(0.5, 1.0, 1.0), [0.0, 1.0, 1.0]);
        assert_eq!(hsv_to_rgb(0.25, 0.0, 0.5), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn gradient_endpoints() {
        let ramp = build_ramps(-6.0, 5.0);
        assert_eq!(ramp.ascending().color(0.0), YELLOW);
        assert_eq!(ramp.color_for(Some(5.0)), RED);
        assert_eq!(ramp.color_for(Some(-6.0)), CYAN);
        assert_eq!(ramp.descending().color(0.0), GREEN);
    }

    #[test]
    fn first_sample_and_zero_speed_share_sink_zero_color() {
        let ramp = build_ramps(-6.0, 5.0);
        let zero = ramp.descending().color(0.0);
        assert_eq!(zero, GREEN);
        assert_eq!(ramp.color_for(None), zero);
        assert_eq!(ramp.color_for(Some(0.0)), zero);
    }

    #[test]
    fn midpoint_interpolates_and_truncates() {
        let ramp = build_ramps(-6.0, 5.0);
        // Hue 1/12: orange, green channel 127.5 truncated.
        assert_eq!(ramp.color_for(Some(2.5)), [255, 127, 0]);
        // Hue 5/12: halfway from cyan to green.
        assert_eq!(ramp.color_for(Some(-3.0)), [0, 255, 127]);
    }

    #[test]
    fn out_of_domain_values_clamp() {
        let ramp = build_ramps(-6.0, 5.0);
        assert_eq!(ramp.color_for(Some(50.0)), RED);
        assert_eq!(ramp.color_for(Some(-60.0)), CYAN);
    }

    #[test]
    fn degenerate_domains_collapse_to_first_hue() {
        let never_climbs = build_ramps(-4.0, 0.0);
        assert!(never_climbs.ascending().is_degenerate());
        assert_eq!(never_climbs.ascending().color(0.0), YELLOW);
        assert_eq!(never_climbs.ascending().color(3.0), YELLOW);

        let never_sinks = build_ramps(0.0, 4.0);
        assert!(never_sinks.descending().is_degenerate());
        assert_eq!(never_sinks.color_for(None), CYAN);
        assert_eq!(never_sinks.color_for(Some(0.0)), CYAN);
        assert_eq!(never_sinks.color_for(Some(4.0)), RED);
    }

    #[test]
    fn table_quantizes_into_steps() {
        let ramp = HueRamp::new([0.0, 1.0], [0.0, 0.5]).with_table_size(Some(2));
        assert_eq!(ramp.hue_at(0.0), 0.0);
        assert_eq!(ramp.hue_at(0.49), 0.0);
        assert_eq!(ramp.hue_at(0.5), 0.5);
        assert_eq!(ramp.hue_at(1.0), 0.5);

        let single = HueRamp::new([0.0, 1.0], [0.25, 0.5]).with_table_size(Some(1));
        assert_eq!(single.hue_at(0.9), 0.25);

        let mut config = RampConfig::default();
        config.table_size = Some(256);
        let ramp = ColorRamp::from_config(-6.0, 5.0, &config);
        assert_eq!(ramp.color_for(Some(5.0)), RED);
        assert_eq!(ramp.color_for(Some(-6.0)), CYAN);
    }

    #[test]
    fn colors_follow_speed_sequence() {
        let ramp = build_ramps(-6.0, 5.0);
        let colors = ramp.colors_for(&[None, Some(5.0), Some(-6.0)]);
        assert_eq!(colors, vec![GREEN, RED, CYAN]);
    }
}
