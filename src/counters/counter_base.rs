pub trait Counter {
    fn add(&mut self, item: &[u8]);
    fn estimate(&self) -> f64;
}
