use crate::side::Side;
use core::ops::{Index, IndexMut};
use derivative::Derivative;
use serde::{Deserialize, Serialize};

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideBundle<T> {
    pub home: T,
    pub guest: T,
}

impl<T> Index<Side> for SideBundle<T> {
    type Output = T;

    fn index(&self, side: Side) -> &Self::Output {
        match side {
            Side::Home => &self.home,
            Side::Guest => &self.guest,
        }
    }
}

impl<T> IndexMut<Side> for SideBundle<T> {
    fn index_mut(&mut self, side: Side) -> &mut Self::Output {
        match side {
            Side::Home => &mut self.home,
            Side::Guest => &mut self.guest,
        }
    }
}
