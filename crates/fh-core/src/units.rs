// fh-core/src/units.rs

use uom::si::f64::{
    ElectricPotential as UomElectricPotential, ElectricalResistance as UomElectricalResistance,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Voltage = UomElectricPotential;
pub type Resistance = UomElectricalResistance;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn mv(v: f64) -> Voltage {
    use uom::si::electric_potential::millivolt;
    Voltage::new::<millivolt>(v)
}

#[inline]
pub fn ohm(v: f64) -> Resistance {
    use uom::si::electrical_resistance::ohm;
    Resistance::new::<ohm>(v)
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn as_mv(v: Voltage) -> f64 {
    use uom::si::electric_potential::millivolt;
    v.get::<millivolt>()
}

#[inline]
pub fn as_ohm(r: Resistance) -> f64 {
    use uom::si::electrical_resistance::ohm;
    r.get::<ohm>()
}

#[inline]
pub fn as_degc(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    t.get::<degree_celsius>()
}
