//! Numerical integration methods
//!
//! Runge-Kutta 4th order integration for the rigid-body plant, whose
//! only integrated state is the 3-vector body rate.

use nalgebra::Vector3;

/// RK4 integrator for Vector3
///
/// Solves dx/dt = f(t, x) over one step of length dt.
pub fn rk4_vec3<F>(x: &Vector3<f64>, t: f64, dt: f64, f: F) -> Vector3<f64>
where
    F: Fn(f64, &Vector3<f64>) -> Vector3<f64>,
{
    let k1 = f(t, x);
    let k2 = f(t + dt / 2.0, &(x + k1 * dt / 2.0));
    let k3 = f(t + dt / 2.0, &(x + k2 * dt / 2.0));
    let k4 = f(t + dt, &(x + k3 * dt));

    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rk4_exponential_decay() {
        // dx/dt = -x, x(0) = (1, 2, -1): exact solution x(0) * e^(-t).
        let mut x = Vector3::new(1.0, 2.0, -1.0);
        let dt = 0.01;
        let mut t = 0.0;

        for _ in 0..100 {
            x = rk4_vec3(&x, t, dt, |_t, x| -x);
            t += dt;
        }

        let decay = (-1.0_f64).exp();
        assert_relative_eq!(x, Vector3::new(1.0, 2.0, -1.0) * decay, epsilon = 1e-8);
    }

    #[test]
    fn test_rk4_constant_forcing() {
        let v0 = Vector3::new(10.0, 0.0, 0.0);
        let g = Vector3::new(0.0, 0.0, -9.81);
        let dt = 0.1;

        let v_new = rk4_vec3(&v0, 0.0, dt, |_t, _v| g);
        assert_relative_eq!(v_new, v0 + g * dt, epsilon = 1e-12);
    }

    #[test]
    fn test_rk4_cross_coupled_rotation() {
        // dx/dt = w x x with constant w: rotates x at rate |w| while
        // preserving its norm, the same structure as the gyroscopic term.
        let w = Vector3::new(0.0, 0.0, 2.0);
        let mut x = Vector3::new(1.0, 0.0, 0.5);
        let dt = 0.001;
        let mut t = 0.0;

        for _ in 0..1000 {
            x = rk4_vec3(&x, t, dt, |_t, x| w.cross(x));
            t += dt;
        }

        assert_relative_eq!(x.norm(), Vector3::new(1.0, 0.0, 0.5).norm(), epsilon = 1e-9);
        // One second at 2 rad/s about z rotates the xy components by 2 rad.
        assert_relative_eq!(x.x, (2.0_f64).cos(), epsilon = 1e-6);
        assert_relative_eq!(x.y, (2.0_f64).sin(), epsilon = 1e-6);
    }
}
