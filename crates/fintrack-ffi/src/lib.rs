//! fintrack-ffi
//!
//! C ABI over the ledger services for mobile and desktop hosts. Every call that
//! can fail returns a status code and fills `out_error` with a heap string the
//! caller releases through [`fintrack_string_free`].

use std::{
    cell::RefCell,
    ffi::{CStr, CString},
    os::raw::{c_char, c_int},
    ptr,
    sync::Arc,
};

use chrono::NaiveDate;

use fintrack_core::{CoreError, Services, SystemClock};
use fintrack_domain::{Amount, EntryId, EntryKind, NewEntry, UserId};
use fintrack_storage_sqlite::SqliteLedgerStore;

pub const FINTRACK_OK: c_int = 0;
pub const FINTRACK_NULL_ARGUMENT: c_int = 1;
pub const FINTRACK_INVALID_ARGUMENT: c_int = 2;
pub const FINTRACK_OPERATION_FAILED: c_int = 3;

pub const FINTRACK_KIND_EXPENSE: c_int = 0;
pub const FINTRACK_KIND_INCOME: c_int = 1;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Opaque pointer owning the open database and the services bound to it.
pub struct LedgerHandle {
    store: Arc<SqliteLedgerStore>,
    services: Services,
}

impl LedgerHandle {
    fn new(store: SqliteLedgerStore) -> *mut Self {
        let store = Arc::new(store);
        let services = Services::new(store.clone(), Arc::new(SystemClock));
        Box::into_raw(Box::new(Self { store, services }))
    }
}

#[no_mangle]
pub extern "C" fn fintrack_open(
    path: *const c_char,
    out_error: *mut *mut c_char,
) -> *mut LedgerHandle {
    clear_error(out_error);
    let path = match unsafe { c_string_argument(path) } {
        Ok(value) => value,
        Err(err) => {
            unsafe { write_core_error(out_error, err) };
            return ptr::null_mut();
        }
    };
    match SqliteLedgerStore::open(&path) {
        Ok(store) => LedgerHandle::new(store),
        Err(err) => {
            unsafe { write_core_error(out_error, err.into()) };
            ptr::null_mut()
        }
    }
}

/// Releases the handle and closes the database. Null handles are ignored.
#[no_mangle]
pub extern "C" fn fintrack_close(handle: *mut LedgerHandle, out_error: *mut *mut c_char) -> c_int {
    clear_error(out_error);
    if handle.is_null() {
        return FINTRACK_OK;
    }
    let LedgerHandle { store, services } = *unsafe { Box::from_raw(handle) };
    drop(services);
    let Ok(store) = Arc::try_unwrap(store) else {
        return FINTRACK_OK;
    };
    match store.close() {
        Ok(()) => FINTRACK_OK,
        Err(err) => {
            unsafe { write_core_error(out_error, err.into()) };
            FINTRACK_OPERATION_FAILED
        }
    }
}

#[no_mangle]
pub extern "C" fn fintrack_user_ensure(
    handle: *const LedgerHandle,
    uid: *const c_char,
    name: *const c_char,
    out_error: *mut *mut c_char,
) -> c_int {
    run(handle, out_error, |services| {
        let uid = unsafe { c_string_argument(uid) }?;
        let name = unsafe { c_string_argument(name) }?;
        services.users.ensure(uid, name)?;
        Ok(())
    })
}

/// Records an expense. `date` is `YYYY-MM-DD`, `note` may be null.
#[no_mangle]
pub extern "C" fn fintrack_expense_add(
    handle: *const LedgerHandle,
    uid: *const c_char,
    title: *const c_char,
    amount: i64,
    category: *const c_char,
    date: *const c_char,
    note: *const c_char,
    out_id: *mut i64,
    out_error: *mut *mut c_char,
) -> c_int {
    add_entry(
        handle,
        EntryKind::Expense,
        EntryArgs {
            uid,
            title,
            amount,
            category,
            date,
            note,
        },
        out_id,
        out_error,
    )
}

/// Records an income. `date` is `YYYY-MM-DD`, `note` may be null.
#[no_mangle]
pub extern "C" fn fintrack_income_add(
    handle: *const LedgerHandle,
    uid: *const c_char,
    title: *const c_char,
    amount: i64,
    category: *const c_char,
    date: *const c_char,
    note: *const c_char,
    out_id: *mut i64,
    out_error: *mut *mut c_char,
) -> c_int {
    add_entry(
        handle,
        EntryKind::Income,
        EntryArgs {
            uid,
            title,
            amount,
            category,
            date,
            note,
        },
        out_id,
        out_error,
    )
}

/// Deletes an entry. `out_deleted` receives 1 when a row was removed, 0 otherwise.
#[no_mangle]
pub extern "C" fn fintrack_entry_delete(
    handle: *const LedgerHandle,
    kind_code: c_int,
    id: i64,
    out_deleted: *mut c_int,
    out_error: *mut *mut c_char,
) -> c_int {
    run(handle, out_error, |services| {
        let kind = entry_kind_from_code(kind_code)?;
        let deleted = services.entries.delete(kind, EntryId(id))?;
        unsafe { write_value(out_deleted, c_int::from(deleted)) };
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn fintrack_user_total(
    handle: *const LedgerHandle,
    uid: *const c_char,
    out_total: *mut i64,
    out_error: *mut *mut c_char,
) -> c_int {
    run(handle, out_error, |services| {
        let uid = UserId::new(unsafe { c_string_argument(uid) }?);
        let total = services
            .users
            .total(&uid)?
            .ok_or(CoreError::UnknownUser(uid))?;
        unsafe { write_value(out_total, total.units()) };
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn fintrack_budget_progress(
    handle: *const LedgerHandle,
    uid: *const c_char,
    category: *const c_char,
    out_percent: *mut u32,
    out_error: *mut *mut c_char,
) -> c_int {
    run(handle, out_error, |services| {
        let uid = UserId::new(unsafe { c_string_argument(uid) }?);
        let category = unsafe { c_string_argument(category) }?;
        let percent = services.budgets.progress(&uid, &category)?;
        unsafe { write_value(out_percent, percent) };
        Ok(())
    })
}

/// Writes a JSON object mapping category to summed amount.
#[no_mangle]
pub extern "C" fn fintrack_category_totals_json(
    handle: *const LedgerHandle,
    uid: *const c_char,
    kind_code: c_int,
    out_json: *mut *mut c_char,
    out_error: *mut *mut c_char,
) -> c_int {
    run(handle, out_error, |services| {
        let uid = UserId::new(unsafe { c_string_argument(uid) }?);
        let kind = entry_kind_from_code(kind_code)?;
        let totals = services.summary.totals_by_category(&uid, kind)?;
        let json = serde_json::to_string(&totals)
            .map_err(|err| CoreError::Validation(err.to_string()))?;
        unsafe { write_string(out_json, json) };
        Ok(())
    })
}

/// Writes a JSON array of the user's transactions, newest first.
#[no_mangle]
pub extern "C" fn fintrack_transactions_json(
    handle: *const LedgerHandle,
    uid: *const c_char,
    out_json: *mut *mut c_char,
    out_error: *mut *mut c_char,
) -> c_int {
    run(handle, out_error, |services| {
        let uid = UserId::new(unsafe { c_string_argument(uid) }?);
        let transactions = services.summary.all_transactions(&uid)?;
        let json = serde_json::to_string(&transactions)
            .map_err(|err| CoreError::Validation(err.to_string()))?;
        unsafe { write_string(out_json, json) };
        Ok(())
    })
}

/// Copy of the last error message raised on the calling thread, or null.
#[no_mangle]
pub extern "C" fn fintrack_last_error() -> *mut c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_deref()
            .and_then(|message| CString::new(message).ok())
            .map_or(ptr::null_mut(), CString::into_raw)
    })
}

#[no_mangle]
pub extern "C" fn fintrack_string_free(value: *mut c_char) {
    if value.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(value));
    }
}

struct EntryArgs {
    uid: *const c_char,
    title: *const c_char,
    amount: i64,
    category: *const c_char,
    date: *const c_char,
    note: *const c_char,
}

fn add_entry(
    handle: *const LedgerHandle,
    kind: EntryKind,
    args: EntryArgs,
    out_id: *mut i64,
    out_error: *mut *mut c_char,
) -> c_int {
    run(handle, out_error, |services| {
        let uid = unsafe { c_string_argument(args.uid) }?;
        let title = unsafe { c_string_argument(args.title) }?;
        let category = unsafe { c_string_argument(args.category) }?;
        let date = parse_date(&unsafe { c_string_argument(args.date) }?)?;
        let mut entry = NewEntry::new(uid, title, Amount::new(args.amount), category, date);
        if !args.note.is_null() {
            entry = entry.with_note(unsafe { c_string_argument(args.note) }?);
        }
        let stored = services.entries.add(kind, entry)?;
        unsafe { write_value(out_id, stored.id.0) };
        Ok(())
    })
}

fn run(
    handle: *const LedgerHandle,
    out_error: *mut *mut c_char,
    call: impl FnOnce(&Services) -> Result<(), CoreError>,
) -> c_int {
    clear_error(out_error);
    if handle.is_null() {
        unsafe { write_error(out_error, "ledger handle is null") };
        return FINTRACK_NULL_ARGUMENT;
    }
    let services = unsafe { &(*handle).services };
    match call(services) {
        Ok(()) => FINTRACK_OK,
        Err(err) => {
            let code = match err {
                CoreError::Validation(_) => FINTRACK_INVALID_ARGUMENT,
                _ => FINTRACK_OPERATION_FAILED,
            };
            unsafe { write_core_error(out_error, err) };
            code
        }
    }
}

fn entry_kind_from_code(code: c_int) -> Result<EntryKind, CoreError> {
    match code {
        FINTRACK_KIND_EXPENSE => Ok(EntryKind::Expense),
        FINTRACK_KIND_INCOME => Ok(EntryKind::Income),
        other => Err(CoreError::Validation(format!("unknown entry kind code {other}"))),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| CoreError::Validation(format!("invalid date `{raw}`: {err}")))
}

fn clear_error(out_error: *mut *mut c_char) {
    if out_error.is_null() {
        return;
    }
    unsafe {
        *out_error = ptr::null_mut();
    }
}

unsafe fn write_error(out_error: *mut *mut c_char, message: &str) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message.to_string()));
    if out_error.is_null() {
        return;
    }
    if let Ok(cstring) = CString::new(message) {
        *out_error = cstring.into_raw();
    }
}

unsafe fn write_core_error(out_error: *mut *mut c_char, err: CoreError) {
    write_error(out_error, &err.to_string());
}

unsafe fn write_string(target: *mut *mut c_char, value: String) {
    if target.is_null() {
        return;
    }
    if let Ok(cstring) = CString::new(value) {
        *target = cstring.into_raw();
    }
}

unsafe fn write_value<T>(target: *mut T, value: T) {
    if !target.is_null() {
        *target = value;
    }
}

unsafe fn c_string_argument(ptr: *const c_char) -> Result<String, CoreError> {
    if ptr.is_null() {
        return Err(CoreError::Validation("null string pointer received".into()));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(|s| s.to_string())
        .map_err(|err| CoreError::Validation(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(value: &str) -> CString {
        CString::new(value).unwrap()
    }

    fn take_string(raw: *mut c_char) -> String {
        assert!(!raw.is_null());
        let value = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_string();
        fintrack_string_free(raw);
        value
    }

    fn open_temp() -> (tempfile::TempDir, *mut LedgerHandle) {
        let dir = tempfile::tempdir().unwrap();
        let path = c(dir.path().join("ledger.db").to_str().unwrap());
        let mut error = ptr::null_mut();
        let handle = fintrack_open(path.as_ptr(), &mut error);
        assert!(error.is_null());
        assert!(!handle.is_null());
        (dir, handle)
    }

    #[test]
    fn round_trip_through_the_c_surface() {
        let (_dir, handle) = open_temp();
        let mut error = ptr::null_mut();
        let uid = c("u1");

        assert_eq!(
            fintrack_user_ensure(handle, uid.as_ptr(), c("Ada").as_ptr(), &mut error),
            FINTRACK_OK
        );

        let mut income_id = 0;
        assert_eq!(
            fintrack_income_add(
                handle,
                uid.as_ptr(),
                c("Pay").as_ptr(),
                1000,
                c("Salary").as_ptr(),
                c("2024-01-01").as_ptr(),
                ptr::null(),
                &mut income_id,
                &mut error,
            ),
            FINTRACK_OK
        );
        let mut expense_id = 0;
        assert_eq!(
            fintrack_expense_add(
                handle,
                uid.as_ptr(),
                c("Rent").as_ptr(),
                300,
                c("Housing").as_ptr(),
                c("2024-01-02").as_ptr(),
                c("january").as_ptr(),
                &mut expense_id,
                &mut error,
            ),
            FINTRACK_OK
        );

        let mut total = 0;
        fintrack_user_total(handle, uid.as_ptr(), &mut total, &mut error);
        assert_eq!(total, 700);

        let mut json = ptr::null_mut();
        assert_eq!(
            fintrack_category_totals_json(
                handle,
                uid.as_ptr(),
                FINTRACK_KIND_EXPENSE,
                &mut json,
                &mut error
            ),
            FINTRACK_OK
        );
        assert_eq!(take_string(json), r#"{"Housing":300}"#);

        let mut json = ptr::null_mut();
        fintrack_transactions_json(handle, uid.as_ptr(), &mut json, &mut error);
        let parsed: serde_json::Value = serde_json::from_str(&take_string(json)).unwrap();
        assert_eq!(parsed[0]["type"], "expense");
        assert_eq!(parsed[1]["type"], "income");

        let mut deleted = 0;
        fintrack_entry_delete(handle, FINTRACK_KIND_EXPENSE, expense_id, &mut deleted, &mut error);
        assert_eq!(deleted, 1);
        fintrack_entry_delete(handle, FINTRACK_KIND_EXPENSE, expense_id, &mut deleted, &mut error);
        assert_eq!(deleted, 0);
        fintrack_user_total(handle, uid.as_ptr(), &mut total, &mut error);
        assert_eq!(total, 1000);

        let mut percent = 99;
        fintrack_budget_progress(
            handle,
            uid.as_ptr(),
            c("Housing").as_ptr(),
            &mut percent,
            &mut error,
        );
        assert_eq!(percent, 0);

        assert_eq!(fintrack_close(handle, &mut error), FINTRACK_OK);
    }

    #[test]
    fn failures_fill_error_and_last_error() {
        let (_dir, handle) = open_temp();
        let mut error = ptr::null_mut();
        let mut id = 0;

        let status = fintrack_expense_add(
            handle,
            c("ghost").as_ptr(),
            c("Tea").as_ptr(),
            3,
            c("Food").as_ptr(),
            c("2024-01-01").as_ptr(),
            ptr::null(),
            &mut id,
            &mut error,
        );
        assert_eq!(status, FINTRACK_OPERATION_FAILED);
        assert!(take_string(error).contains("ghost"));
        assert!(take_string(fintrack_last_error()).contains("ghost"));

        let mut error = ptr::null_mut();
        fintrack_user_ensure(handle, c("u1").as_ptr(), c("Ada").as_ptr(), &mut error);
        let status = fintrack_expense_add(
            handle,
            c("u1").as_ptr(),
            c("Tea").as_ptr(),
            3,
            c("Food").as_ptr(),
            c("01/02/2024").as_ptr(),
            ptr::null(),
            &mut id,
            &mut error,
        );
        assert_eq!(status, FINTRACK_INVALID_ARGUMENT);
        fintrack_string_free(error);

        let mut error = ptr::null_mut();
        assert_eq!(
            fintrack_user_total(ptr::null(), c("u1").as_ptr(), &mut 0, &mut error),
            FINTRACK_NULL_ARGUMENT
        );
        fintrack_string_free(error);

        assert_eq!(fintrack_close(handle, ptr::null_mut()), FINTRACK_OK);
    }
}
