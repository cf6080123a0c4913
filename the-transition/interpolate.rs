//! Interpolation rules for transition values.
//!
//! A transition is generic over its value type. The engine never looks at the
//! value itself, it only asks an [`Interpolator`] for the value at some eased
//! progress between `start` and `goal`. Types either implement
//! [`Interpolable`] or have a rule registered in an
//! [`InterpolationRegistry`] at start-up.

use std::{
  any::{
    Any,
    TypeId,
    type_name,
  },
  collections::HashMap,
  fmt,
  sync::Arc,
};

use crate::error::{
  Result,
  TransitionError,
};

/// Shared interpolation rule: `(start, goal, progress) -> value`.
pub type Interpolator<V> = Arc<dyn Fn(&V, &V, f64) -> V + Send + Sync>;

/// Trait for values that know how to blend towards another value.
pub trait Interpolable: Sized {
  /// `progress` is eased progress: usually in `[0, 1]`, but overshooting
  /// curves may step slightly outside.
  fn interpolate(&self, goal: &Self, progress: f64) -> Self;
}

/// Interpolation rule backed by [`Interpolable`].
pub fn interpolator<V>() -> Interpolator<V>
where
  V: Interpolable + 'static,
{
  Arc::new(|start: &V, goal: &V, progress: f64| start.interpolate(goal, progress))
}

impl Interpolable for f32 {
  fn interpolate(&self, goal: &Self, progress: f64) -> Self {
    self + (goal - self) * progress as f32
  }
}

impl Interpolable for f64 {
  fn interpolate(&self, goal: &Self, progress: f64) -> Self {
    self + (goal - self) * progress
  }
}

macro_rules! integer_interpolable {
  ($($ty:ty),*) => {
    $(
      impl Interpolable for $ty {
        fn interpolate(&self, goal: &Self, progress: f64) -> Self {
          let start = *self as f64;
          let end = *goal as f64;
          (start + (end - start) * progress).round() as $ty
        }
      }
    )*
  };
}

integer_interpolable!(i32, i64, u8, u32, usize);

impl Interpolable for (f32, f32) {
  fn interpolate(&self, goal: &Self, progress: f64) -> Self {
    (
      self.0.interpolate(&goal.0, progress),
      self.1.interpolate(&goal.1, progress),
    )
  }
}

impl Interpolable for (f64, f64) {
  fn interpolate(&self, goal: &Self, progress: f64) -> Self {
    (
      self.0.interpolate(&goal.0, progress),
      self.1.interpolate(&goal.1, progress),
    )
  }
}

/// RGBA color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
  pub r: f32,
  pub g: f32,
  pub b: f32,
  pub a: f32,
}

impl Color {
  pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
  pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
  pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

  pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
    Self { r, g, b, a }
  }

  pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
    Self::rgba(r, g, b, 1.0)
  }

  /// Build from 8-bit channels.
  pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self::rgba(
      f32::from(r) / 255.0,
      f32::from(g) / 255.0,
      f32::from(b) / 255.0,
      f32::from(a) / 255.0,
    )
  }
}

impl Interpolable for Color {
  fn interpolate(&self, goal: &Self, progress: f64) -> Self {
    // overshooting curves must not push channels out of range
    let channel = |from: f32, to: f32| from.interpolate(&to, progress).clamp(0.0, 1.0);
    Color {
      r: channel(self.r, goal.r),
      g: channel(self.g, goal.g),
      b: channel(self.b, goal.b),
      a: channel(self.a, goal.a),
    }
  }
}

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

impl Interpolable for Point {
  fn interpolate(&self, goal: &Self, progress: f64) -> Self {
    Point {
      x: self.x.interpolate(&goal.x, progress),
      y: self.y.interpolate(&goal.y, progress),
    }
  }
}

/// Typed table of interpolation rules keyed by value type.
///
/// Lets hosts animate types they do not own (and so cannot implement
/// [`Interpolable`] for) by registering a rule once at start-up.
#[derive(Default)]
pub struct InterpolationRegistry {
  rules: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl InterpolationRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry with rules for every built-in [`Interpolable`] type.
  pub fn with_defaults() -> Self {
    let mut registry = Self::new();
    registry.register_interpolable::<f32>();
    registry.register_interpolable::<f64>();
    registry.register_interpolable::<i32>();
    registry.register_interpolable::<i64>();
    registry.register_interpolable::<u8>();
    registry.register_interpolable::<u32>();
    registry.register_interpolable::<usize>();
    registry.register_interpolable::<(f32, f32)>();
    registry.register_interpolable::<(f64, f64)>();
    registry.register_interpolable::<Color>();
    registry.register_interpolable::<Point>();
    registry
  }

  /// Register (or replace) the rule for `V`.
  pub fn register<V, F>(&mut self, rule: F)
  where
    V: 'static,
    F: Fn(&V, &V, f64) -> V + Send + Sync + 'static,
  {
    let rule: Interpolator<V> = Arc::new(rule);
    self.rules.insert(TypeId::of::<V>(), Box::new(rule));
  }

  pub fn register_interpolable<V>(&mut self)
  where
    V: Interpolable + 'static,
  {
    self
      .rules
      .insert(TypeId::of::<V>(), Box::new(interpolator::<V>()));
  }

  pub fn contains<V: 'static>(&self) -> bool {
    self.rules.contains_key(&TypeId::of::<V>())
  }

  /// Rule registered for `V`.
  pub fn get<V: 'static>(&self) -> Result<Interpolator<V>> {
    self
      .rules
      .get(&TypeId::of::<V>())
      .and_then(|rule| rule.downcast_ref::<Interpolator<V>>())
      .cloned()
      .ok_or(TransitionError::MissingInterpolator(type_name::<V>()))
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

impl fmt::Debug for InterpolationRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("InterpolationRegistry")
      .field("rules", &self.rules.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_f32_interpolate() {
    let start = 0.0_f32;
    let end = 10.0_f32;
    assert_eq!(start.interpolate(&end, 0.0), 0.0);
    assert_eq!(start.interpolate(&end, 0.5), 5.0);
    assert_eq!(start.interpolate(&end, 1.0), 10.0);
  }

  #[test]
  fn test_integer_rounding() {
    assert_eq!(0_i32.interpolate(&10, 0.26), 3);
    assert_eq!(10_u8.interpolate(&0, 0.5), 5);
    assert_eq!(0_usize.interpolate(&3, 0.49), 1);
  }

  #[test]
  fn test_color_interpolate_clamps() {
    let mid = Color::BLACK.interpolate(&Color::WHITE, 0.5);
    assert_eq!(mid, Color::rgb(0.5, 0.5, 0.5));
    let past = Color::BLACK.interpolate(&Color::WHITE, 1.2);
    assert_eq!(past, Color::WHITE);
  }

  #[test]
  fn test_point_interpolate() {
    let a = Point::new(0.0, 10.0);
    let b = Point::new(10.0, 0.0);
    assert_eq!(a.interpolate(&b, 0.25), Point::new(2.5, 7.5));
  }

  #[test]
  fn test_registry_defaults() {
    let registry = InterpolationRegistry::with_defaults();
    assert!(registry.contains::<Color>());
    let rule = registry.get::<f64>().unwrap();
    assert_eq!(rule(&2.0, &4.0, 0.5), 3.0);
  }

  #[test]
  fn test_registry_custom_rule() {
    #[derive(Debug, Clone, PartialEq)]
    struct Label(String);

    let mut registry = InterpolationRegistry::new();
    assert_eq!(
      registry.get::<Label>().err(),
      Some(TransitionError::MissingInterpolator(type_name::<Label>()))
    );

    registry.register(|start: &Label, goal: &Label, progress: f64| {
      if progress < 0.5 {
        start.clone()
      } else {
        goal.clone()
      }
    });
    let rule = registry.get::<Label>().unwrap();
    let a = Label("a".into());
    let b = Label("b".into());
    assert_eq!(rule(&a, &b, 0.2), a);
    assert_eq!(rule(&a, &b, 0.7), b);
  }
}
