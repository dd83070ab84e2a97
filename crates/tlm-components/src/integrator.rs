//! Damped double integrators used by inertia elements.
//!
//! Both integrate `dv/dt = u - (w0/dt) v`, `dx/dt = v` with the bilinear
//! (Tustin) transform:
//!
//! ```text
//! v[n] = ((2 - w0) v[n-1] + dt (u[n] + u[n-1])) / (2 + w0)
//! x[n] = x[n-1] + dt/2 (v[n] + v[n-1])
//! ```
//!
//! where `w0 = damping * dt / mass` is set every step.

use crate::common::sign;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct State {
    u: f64,
    v: f64,
    x: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DoubleIntegratorWithDamping {
    dt: f64,
    w0: f64,
    state: State,
}

impl DoubleIntegratorWithDamping {
    pub fn initialize(&mut self, dt: f64, w0: f64, u0: f64, x0: f64, v0: f64) {
        self.dt = dt;
        self.w0 = w0;
        self.initialize_values(u0, x0, v0);
    }

    /// Re-seed the state, e.g. after a position clamp.
    pub fn initialize_values(&mut self, u0: f64, x0: f64, v0: f64) {
        self.state = State { u: u0, v: v0, x: x0 };
    }

    pub fn set_damping(&mut self, w0: f64) {
        self.w0 = w0;
    }

    pub fn integrate(&mut self, u: f64) {
        let State { u: u_old, v: v_old, x: x_old } = self.state;
        let v = ((2.0 - self.w0) * v_old + self.dt * (u + u_old)) / (2.0 + self.w0);
        let x = x_old + 0.5 * self.dt * (v + v_old);
        self.state = State { u, v, x };
    }

    pub fn velocity(&self) -> f64 {
        self.state.v
    }

    pub fn position(&self) -> f64 {
        self.state.x
    }
}

/// Damped double integrator with a Coulomb friction law.
///
/// Friction levels are given per unit mass (acceleration). A body at rest
/// stays at rest while `|u| <= static_friction`; equality sticks. Sliding
/// bodies feel `kinetic_friction` against their direction of motion and
/// stick again when the velocity would change sign within one step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DoubleIntegratorWithDampingAndCoulombFriction {
    dt: f64,
    w0: f64,
    static_friction: f64,
    kinetic_friction: f64,
    state: State,
}

impl DoubleIntegratorWithDampingAndCoulombFriction {
    pub fn initialize(&mut self, dt: f64, w0: f64, static_friction: f64, kinetic_friction: f64, x0: f64, v0: f64) {
        self.dt = dt;
        self.w0 = w0;
        self.set_friction(static_friction, kinetic_friction);
        self.initialize_values(0.0, x0, v0);
    }

    pub fn initialize_values(&mut self, u0: f64, x0: f64, v0: f64) {
        self.state = State { u: u0, v: v0, x: x0 };
    }

    pub fn set_damping(&mut self, w0: f64) {
        self.w0 = w0;
    }

    pub fn set_friction(&mut self, static_friction: f64, kinetic_friction: f64) {
        self.static_friction = static_friction.abs();
        self.kinetic_friction = kinetic_friction.abs();
    }

    pub fn is_sticking(&self) -> bool {
        self.state.v == 0.0
    }

    pub fn integrate(&mut self, u: f64) {
        let State { u: u_old, v: v_old, x: x_old } = self.state;

        if v_old == 0.0 && u.abs() <= self.static_friction {
            // Friction balances the load; the stored input is the net
            // acceleration, which is zero while stuck.
            self.state = State { u: 0.0, v: 0.0, x: x_old };
            return;
        }

        let direction = if v_old != 0.0 { sign(v_old) } else { sign(u) };
        let u_eff = u - self.kinetic_friction * direction;
        let mut v = ((2.0 - self.w0) * v_old + self.dt * (u_eff + u_old)) / (2.0 + self.w0);
        if v_old != 0.0 && v * v_old < 0.0 {
            v = 0.0;
        }
        let x = x_old + 0.5 * self.dt * (v + v_old);
        self.state = State { u: u_eff, v, x };
    }

    pub fn velocity(&self) -> f64 {
        self.state.v
    }

    pub fn position(&self) -> f64 {
        self.state.x
    }
}
