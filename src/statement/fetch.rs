use crate::error::StatementError;
use crate::fetch_mode::{FetchArgs, FetchMode};
use crate::native::{NativeConnection, NativeStatement};
use crate::results::{AssocRow, CustomDbRow, FetchedRow};
use crate::types::RowValues;

use super::Statement;

impl<C: NativeConnection> Statement<C> {
    /// Fetch the next row in the default mode.
    ///
    /// # Errors
    /// See [`Statement::fetch_with`].
    pub fn fetch(&mut self) -> Result<Option<FetchedRow>, StatementError> {
        self.fetch_with(self.default_mode, FetchArgs::default())
    }

    /// Fetch the next row shaped by `mode`.
    ///
    /// Returns `Ok(None)` without consulting `mode` when nothing has been executed or the result
    /// set is exhausted or closed.
    ///
    /// # Errors
    /// [`StatementError::UnsupportedFetchMode`] for modes outside the supported set,
    /// [`StatementError::Fetch`] for driver failures, [`StatementError::InvalidColumnIndex`] for
    /// `COLUMN` with an out-of-range column, and whatever a hydration factory returns.
    pub fn fetch_with(
        &mut self,
        mode: FetchMode,
        args: FetchArgs,
    ) -> Result<Option<FetchedRow>, StatementError> {
        if self.native.is_none() || !self.result_active {
            return Ok(None);
        }

        match mode {
            FetchMode::MIXED => Ok(self.next_native_row()?.map(FetchedRow::Mixed)),
            FetchMode::ASSOCIATIVE => Ok(self
                .next_native_row()?
                .map(|row| FetchedRow::Associative(AssocRow::from(row)))),
            FetchMode::NUMERIC => Ok(self
                .next_native_row()?
                .map(|row| FetchedRow::Numeric(row.rows))),
            FetchMode::COLUMN => Ok(self
                .fetch_column(args.column.unwrap_or(0))?
                .map(FetchedRow::Column)),
            FetchMode::STANDARD_OBJECT | FetchMode::CUSTOM_OBJECT => {
                let target = args.target.unwrap_or_else(|| self.default_target.clone());
                let ctor_args = args
                    .ctor_args
                    .unwrap_or_else(|| self.default_ctor_args.clone());
                let Some(native) = self.native.as_mut() else {
                    return Ok(None);
                };
                let object = match native.fetch_object(&target, &ctor_args) {
                    Ok(object) => object,
                    Err(err) => {
                        if let Some(diag) = err.diagnostic() {
                            self.last_error = Some(diag.clone());
                        }
                        return Err(err);
                    }
                };
                if object.is_none() {
                    self.result_active = false;
                }
                Ok(object.map(FetchedRow::Object))
            }
            other => Err(StatementError::UnsupportedFetchMode(other.to_string())),
        }
    }

    /// Set the default mode used by [`fetch`](Statement::fetch) and
    /// [`fetch_all`](Statement::fetch_all). A target or constructor arguments in `args` replace
    /// the defaults used by the object modes.
    pub fn set_fetch_mode(&mut self, mode: FetchMode, args: FetchArgs) {
        self.default_mode = mode;
        if let Some(target) = args.target {
            self.default_target = target;
        }
        if let Some(ctor_args) = args.ctor_args {
            self.default_ctor_args = ctor_args;
        }
    }

    #[must_use]
    pub fn fetch_mode(&self) -> FetchMode {
        self.default_mode
    }

    /// Value at `index` of the next row, `Ok(None)` once rows run out.
    ///
    /// The row is consumed even when `index` is out of range.
    ///
    /// # Errors
    /// [`StatementError::InvalidColumnIndex`] when the row has no column `index`;
    /// [`StatementError::Fetch`] for driver failures.
    pub fn fetch_column(&mut self, index: usize) -> Result<Option<RowValues>, StatementError> {
        if self.native.is_none() || !self.result_active {
            return Ok(None);
        }
        let Some(mut row) = self.next_native_row()? else {
            return Ok(None);
        };
        let column_count = row.len();
        if index >= column_count {
            return Err(StatementError::InvalidColumnIndex {
                index,
                column_count,
            });
        }
        Ok(Some(row.rows.swap_remove(index)))
    }

    /// Fetch every remaining row. `None` uses the default mode. The cursor is exhausted
    /// afterwards.
    ///
    /// # Errors
    /// The first error any single fetch returns.
    pub fn fetch_all(
        &mut self,
        mode: Option<FetchMode>,
        args: FetchArgs,
    ) -> Result<Vec<FetchedRow>, StatementError> {
        let mode = mode.unwrap_or(self.default_mode);
        let mut rows = Vec::new();

        if mode == FetchMode::COLUMN {
            let index = args.column.unwrap_or(0);
            while let Some(value) = self.fetch_column(index)? {
                rows.push(FetchedRow::Column(value));
            }
        } else {
            while let Some(row) = self.fetch_with(mode, args.clone())? {
                rows.push(row);
            }
        }

        tracing::trace!("fetch_all materialized {} rows", rows.len());
        Ok(rows)
    }

    /// Iterate over the remaining rows in the default mode.
    pub fn rows(&mut self) -> Rows<'_, C> {
        Rows {
            stmt: self,
            failed: false,
        }
    }

    /// Discard the remaining rows of the active result set.
    ///
    /// Safe to call at any time: driver failures while draining count as exhaustion.
    pub fn close_cursor(&mut self) {
        if !self.result_active {
            return;
        }
        let Some(native) = self.native.as_mut() else {
            return;
        };

        let mut discarded = 0usize;
        loop {
            match native.fetch() {
                Ok(Some(_)) => discarded += 1,
                Ok(None) => break,
                Err(diag) => {
                    tracing::warn!("native fetch failed while closing cursor: {diag}");
                    break;
                }
            }
        }
        tracing::trace!("close_cursor discarded {discarded} rows");
        self.result_active = false;
    }

    fn next_native_row(&mut self) -> Result<Option<CustomDbRow>, StatementError> {
        let Some(native) = self.native.as_mut() else {
            return Ok(None);
        };
        match native.fetch() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.result_active = false;
                Ok(None)
            }
            Err(diag) => {
                self.last_error = Some(diag.clone());
                Err(StatementError::Fetch(diag))
            }
        }
    }
}

/// Iterator returned by [`Statement::rows`]. Stops after the first error.
pub struct Rows<'a, C: NativeConnection> {
    stmt: &'a mut Statement<C>,
    failed: bool,
}

impl<C: NativeConnection> Iterator for Rows<'_, C> {
    type Item = Result<FetchedRow, StatementError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.stmt.fetch().transpose();
        self.failed = matches!(next, Some(Err(_)));
        next
    }
}
