//! Per-program scalar or packed-color maps (heat, cooling, sand, trails).

/// A `width × height` grid of plain values, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueMap<T> {
    width: usize,
    height: usize,
    values: Vec<T>,
}

impl<T: Copy + Default> ValueMap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![T::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        self.values[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.values[y * self.width + x] = value;
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.values[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.values[y * self.width..(y + 1) * self.width]
    }

    pub fn fill_row(&mut self, y: usize, value: T) {
        self.row_mut(y).fill(value);
    }

    /// Move every row up by one. Row 0 is discarded and the last row keeps its
    /// previous contents until the caller overwrites it.
    pub fn shift_rows_up(&mut self) {
        if self.height > 1 {
            self.values.copy_within(self.width.., 0);
        }
    }

    pub fn copy_from(&mut self, other: &ValueMap<T>) {
        self.values.copy_from_slice(&other.values);
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }
}
