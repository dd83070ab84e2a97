// tlm-core/src/units.rs

use uom::si::f64::{
    Force as UomForce, Length as UomLength, Mass as UomMass, Pressure as UomPressure,
    Ratio as UomRatio, Time as UomTime, Velocity as UomVelocity, Volume as UomVolume,
    VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Force = UomForce;
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Pressure = UomPressure;
pub type Ratio = UomRatio;
pub type Time = UomTime;
pub type Velocity = UomVelocity;
pub type Volume = UomVolume;
pub type VolumeRate = UomVolumeRate;

/// A uom quantity stored by the kernel as its SI base value.
pub trait SiQuantity {
    /// Unit symbol written into parameter metadata.
    const UNIT: &'static str;

    fn si_value(&self) -> f64;
}

macro_rules! si_quantity {
    ($($ty:ty => $unit:literal),* $(,)?) => {
        $(
            impl SiQuantity for $ty {
                const UNIT: &'static str = $unit;

                #[inline]
                fn si_value(&self) -> f64 {
                    self.value
                }
            }
        )*
    };
}

si_quantity! {
    Force => "N",
    Length => "m",
    Mass => "kg",
    Pressure => "Pa",
    Ratio => "-",
    Time => "s",
    Velocity => "m/s",
    Volume => "m^3",
    VolumeRate => "m^3/s",
}

#[inline]
pub fn newton(v: f64) -> Force {
    use uom::si::force::newton;
    Force::new::<newton>(v)
}

#[inline]
pub fn meter(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn pascal(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn second(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn si_values_are_base_units() {
        assert_eq!(newton(12.0).si_value(), 12.0);
        assert_eq!(bar(1.0).si_value(), 1e5);
        assert_eq!(m3ps(2e-4).si_value(), 2e-4);
        assert_eq!(<Pressure as SiQuantity>::UNIT, "Pa");
        assert_eq!(<Velocity as SiQuantity>::UNIT, "m/s");
    }

    #[test]
    fn constructors_smoke() {
        let _f = newton(1.0);
        let _x = meter(0.5);
        let _m = kg(2.0);
        let _dt = second(1e-3);
        let _v = mps(0.1);
        let _vol = m3(1e-3);
        let _r = unitless(0.5);
    }
}
