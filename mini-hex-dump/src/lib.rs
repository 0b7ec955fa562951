use std::fmt;

/// Writes `cells` as rows of `cells_per_row` hex numbers, each padded to
/// `digits` digits and labelled with the index of its first cell. An extra
/// space splits each row in half.
pub fn display_cells<T>(
    cells: &[T],
    cells_per_row: usize,
    digits: usize,
    f: &mut fmt::Formatter,
) -> Result<(), fmt::Error>
where
    T: fmt::UpperHex,
{
    let index_length = {
        let max_index: u32 = cells.len().saturating_sub(1).min(u32::MAX as usize) as u32;
        let num_bits = 32 - max_index.leading_zeros();
        let num_nybles = if num_bits == 0 {
            0
        } else {
            ((num_bits - 1) / 4) + 1
        };
        num_nybles
    } as usize;
    let half_row = cells_per_row / 2;
    for (row_index, row) in cells.chunks(cells_per_row).enumerate() {
        write!(
            f,
            "0x{:0>width$X}:",
            row_index * cells_per_row,
            width = index_length,
        )?;
        for (column, cell) in row.iter().enumerate() {
            if column == half_row && half_row > 0 {
                write!(f, " ")?;
            }
            write!(f, " {:0width$X}", cell, width = digits)?;
        }
        writeln!(f)?;
    }
    Ok(())
}

pub fn display_bytes(
    bytes: &[u8],
    bytes_per_row: usize,
    f: &mut fmt::Formatter,
) -> Result<(), fmt::Error> {
    display_cells(bytes, bytes_per_row, 2, f)
}

pub struct Bytes<'a>(pub &'a [u8]);

impl<'a> fmt::Display for Bytes<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        display_bytes(self.0, 16, f)?;
        Ok(())
    }
}
