use serde::{Deserialize, Serialize};

/// The garment vocabulary the wardrobe tracks. One photo contributes at most
/// one crop per variant.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentType {
	Shirt,
	Pants,
}
impl GarmentType {
	pub const ALL: [Self; 2] = [Self::Shirt, Self::Pants];

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"shirt" => Some(Self::Shirt),
			"pants" => Some(Self::Pants),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Shirt => "shirt",
			Self::Pants => "pants",
		}
	}
}
