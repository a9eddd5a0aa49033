use crate::meshlet::MESHLET_PAYLOAD_SUBGROUP_SIZE;

/// Interprets the low `bits` bits of `raw` as a two's complement number. Zero bits always yield 0.
#[inline]
pub fn sign_extend(raw: u32, bits: u32) -> i32 {
	if bits == 0 {
		0
	} else {
		let shift = u32::BITS - bits;
		((raw << shift) as i32) >> shift
	}
}

/// Reads one lane's values out of a bit-transposed word stream.
///
/// Every word holds the same bit-plane of all [`MESHLET_PAYLOAD_SUBGROUP_SIZE`] lanes, one bit per lane, so all lanes
/// of a subgroup walk the same words and only differ in which bit they test. A value of `n` bits is stored in `n`
/// consecutive words, least significant plane first.
#[derive(Copy, Clone, Debug)]
pub struct BitTransposedReader<'a> {
	words: &'a [u32],
	cursor: usize,
	lane: u32,
}

impl<'a> BitTransposedReader<'a> {
	#[inline]
	pub fn new(words: &'a [u32], offset: u32, lane: usize) -> Self {
		assert!(
			lane < MESHLET_PAYLOAD_SUBGROUP_SIZE,
			"lane {} out of bounds for a subgroup of {}",
			lane,
			MESHLET_PAYLOAD_SUBGROUP_SIZE
		);
		Self {
			words,
			cursor: offset as usize,
			lane: lane as u32,
		}
	}

	/// Word the next bit-plane is read from.
	#[inline]
	pub fn cursor(&self) -> usize {
		self.cursor
	}

	#[inline]
	pub fn lane(&self) -> usize {
		self.lane as usize
	}

	/// Reads an unsigned `bits` wide value and advances the cursor by `bits` words.
	#[inline]
	pub fn read_unsigned(&mut self, bits: u32) -> u32 {
		let mut value = 0;
		for i in 0..bits {
			value |= ((self.words[self.cursor] >> self.lane) & 1) << i;
			self.cursor += 1;
		}
		value
	}

	/// Reads a sign extended `bits` wide value and advances the cursor by `bits` words.
	#[inline]
	pub fn read_signed(&mut self, bits: u32) -> i32 {
		sign_extend(self.read_unsigned(bits), bits)
	}
}

/// Appends `bits` bit-planes of the lane values to `out`, the inverse of [`BitTransposedReader::read_unsigned`].
#[cfg(feature = "disk")]
pub fn write_bitplanes(values: &[i32; MESHLET_PAYLOAD_SUBGROUP_SIZE], bits: u32, out: &mut std::vec::Vec<u32>) {
	for plane in 0..bits {
		let mut word = 0;
		for (lane, value) in values.iter().enumerate() {
			word |= ((*value as u32 >> plane) & 1) << lane;
		}
		out.push(word);
	}
}
