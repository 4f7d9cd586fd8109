//! The local merge kernel (§4.11 "Merge kernel"): both sides are
//! already sorted on `(hash, keys)`; this walks them with two cursors,
//! using `mark`/`set_idx` to rewind the right cursor over a duplicate-key
//! run once per matching left row -- the classic merge-join duplicate
//! handling.

use std::cmp::Ordering;
use tupleio::SortedCursor;
use value::{compare_keys, JoinResult, Tuple, Value};

/// The hash column is always a tuple's last element (`attach_hash` appends
/// it), so its index is read per tuple -- the two sides of a join don't
/// generally keep the same number of payload columns, so a fixed index
/// would point at the wrong column (or past the end) on the narrower side.
fn hash_of(tuple: &Tuple) -> i64 {
    match tuple.last() {
        Some(Value::Int64(h)) => *h,
        Some(Value::Int32(h)) => *h as i64,
        other => panic!("merge kernel tuple's hash column is not integral: {other:?}"),
    }
}

fn keys_of(tuple: &Tuple, num_keys: usize) -> &[Value] {
    &tuple[..num_keys]
}

/// Runs the merge kernel over two `(hash, keys)`-sorted tuple slices,
/// invoking `emit(left_idx, left_tuple, right_idx, right_tuple)` once per
/// matching pair -- the indices let a caller track which rows were matched
/// for outer-join finalize, without this kernel needing to know anything
/// about outer semantics itself.
pub fn merge_join<F>(left: &[Tuple], right: &[Tuple], num_keys: usize, mut emit: F) -> JoinResult<()>
where
    F: FnMut(usize, &Tuple, usize, &Tuple) -> JoinResult<()>,
{
    let mut cl = SortedCursor::new(left);
    let mut cr = SortedCursor::new(right);

    loop {
        if cl.end() || cr.end() {
            return Ok(());
        }

        // Step 1: align hashes.
        loop {
            if cl.end() || cr.end() {
                return Ok(());
            }
            let hl = hash_of(cl.tuple()?);
            let hr = hash_of(cr.tuple()?);
            match hr.cmp(&hl) {
                Ordering::Less => cr.next()?,
                Ordering::Greater => cl.next()?,
                Ordering::Equal => break,
            }
        }
        if cl.end() || cr.end() {
            return Ok(());
        }

        // Step 2: align keys within the now-matching hash.
        loop {
            if cl.end() || cr.end() {
                break;
            }
            let hl = hash_of(cl.tuple()?);
            let hr = hash_of(cr.tuple()?);
            if hr != hl {
                cl.next()?;
                break;
            }
            let kl = keys_of(cl.tuple()?, num_keys).to_vec();
            let kr = keys_of(cr.tuple()?, num_keys).to_vec();
            match compare_keys(&kr, &kl) {
                Ordering::Less => cr.next()?,
                Ordering::Greater => {
                    cl.next()?;
                    break;
                }
                Ordering::Equal => break,
            }
        }
        if cl.end() || cr.end() {
            return Ok(());
        }

        let hl = hash_of(cl.tuple()?);
        let hr = hash_of(cr.tuple()?);
        let kl = keys_of(cl.tuple()?, num_keys).to_vec();
        let kr = keys_of(cr.tuple()?, num_keys).to_vec();
        if hl != hr || compare_keys(&kl, &kr) != Ordering::Equal {
            continue;
        }

        // Step 3: emit the whole matching run, remembering where it started
        // on the right so step 4 can rewind over it.
        let right_mark = cr.get_idx();
        let snapshot_keys = kl.clone();
        loop {
            if cr.end() {
                break;
            }
            let hr = hash_of(cr.tuple()?);
            let kr = keys_of(cr.tuple()?, num_keys).to_vec();
            if hr != hl || compare_keys(&kr, &snapshot_keys) != Ordering::Equal {
                break;
            }
            emit(cl.get_idx(), cl.tuple()?, cr.get_idx(), cr.tuple()?)?;
            cr.next()?;
        }

        // Step 4: advance the left cursor; rewind the right cursor over the
        // same duplicate-key run if the next left row shares the key.
        cl.next()?;
        if !cl.end() {
            let kl_new = keys_of(cl.tuple()?, num_keys);
            if compare_keys(kl_new, &snapshot_keys) == Ordering::Equal {
                cr.set_idx(right_mark);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(key: i32, hash: i64, payload: &str) -> Tuple {
        vec![Value::Int32(key), Value::Str(payload.to_string()), Value::Int64(hash)]
    }

    #[test]
    fn single_match_per_side() {
        let left = vec![t(1, 5, "a"), t(2, 9, "b")];
        let right = vec![t(1, 5, "x"), t(3, 20, "z")];
        let mut pairs = Vec::new();
        merge_join(&left, &right, 1, |_, l, _, r| {
            pairs.push((l.clone(), r.clone()));
            Ok(())
        })
        .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0[0], Value::Int32(1));
        assert_eq!(pairs[0].1[0], Value::Int32(1));
    }

    #[test]
    fn duplicate_key_run_on_both_sides_cross_joins() {
        // S-2: L=[(1,a),(1,b)], R=[(1,x),(1,y)] -> 4 pairs, same hash.
        let left = vec![t(1, 5, "a"), t(1, 5, "b")];
        let right = vec![t(1, 5, "x"), t(1, 5, "y")];
        let mut pairs = Vec::new();
        merge_join(&left, &right, 1, |_, l, _, r| {
            pairs.push((payload(l), payload(r)));
            Ok(())
        })
        .unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "x".to_string()),
                ("a".to_string(), "y".to_string()),
                ("b".to_string(), "x".to_string()),
                ("b".to_string(), "y".to_string()),
            ]
        );
    }

    fn payload(t: &Tuple) -> String {
        if let Value::Str(s) = &t[1] {
            s.clone()
        } else {
            unreachable!()
        }
    }

    #[test]
    fn no_overlap_emits_nothing() {
        let left = vec![t(1, 5, "a")];
        let right = vec![t(2, 9, "z")];
        let mut n = 0;
        merge_join(&left, &right, 1, |_, _, _, _| {
            n += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(n, 0);
    }
}
