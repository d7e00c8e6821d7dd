//! Deterministic demo snapshots used when neither REST nor the realtime feed
//! is reachable. The same inputs always produce the same data.

use crate::types::{DepartmentStatistics, QueueItem, QueueStatistics, QueueUpdate};

const DEMO_PATIENTS: [&str; 8] = [
    "Amara Okafor",
    "Lucas Meyer",
    "Priya Nair",
    "Tomás Silva",
    "Hana Kobayashi",
    "Omar Haddad",
    "Elena Petrova",
    "Samuel Mensah",
];

fn ticket_prefix(department_id: i64) -> char {
    let offset = department_id.rem_euclid(26) as u8;
    (b'A' + offset) as char
}

/// Small LCG so demo data varies between departments but never between runs
fn mix(seed: u64) -> u64 {
    seed.wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407)
}

/// Synthetic queue snapshot for one department.
///
/// The first entry is being served, every fourth entry is urgent.
pub fn demo_queue(department_id: i64, len: usize) -> QueueUpdate {
    let prefix = ticket_prefix(department_id);
    let mut seed = mix(department_id as u64);

    let queue = (0..len)
        .map(|i| {
            seed = mix(seed);
            let mut item = QueueItem::new(department_id.wrapping_mul(1000).wrapping_add(i as i64 + 1));
            item.ticket_number = Some(format!("{}-{:03}", prefix, 100 + i));
            item.patient_name = Some(DEMO_PATIENTS[(seed >> 33) as usize % DEMO_PATIENTS.len()].to_string());
            item.service_id = Some(department_id);
            item.status = Some(if i == 0 { "called" } else { "waiting" }.to_string());
            item.priority = Some(if i % 4 == 3 { "urgent" } else { "normal" }.to_string());
            item.position = Some(i as u32 + 1);
            item.estimated_wait_minutes = Some(i as u32 * 7 + (seed >> 60) as u32 % 5);
            item
        })
        .collect();

    QueueUpdate::new(department_id, queue)
}

/// Synthetic statistics consistent with [`demo_queue`] for the given departments
pub fn demo_statistics(department_ids: &[i64], queue_len: usize) -> QueueStatistics {
    let departments: Vec<DepartmentStatistics> = department_ids
        .iter()
        .map(|&department_id| {
            let update = demo_queue(department_id, queue_len);
            let waiting = update
                .queue
                .iter()
                .filter(|item| item.status.as_deref() == Some("waiting"))
                .count() as u32;
            let total_wait: u32 = update
                .queue
                .iter()
                .filter_map(|item| item.estimated_wait_minutes)
                .sum();
            let average_wait_minutes = if update.queue.is_empty() {
                0.0
            } else {
                f64::from(total_wait) / update.queue.len() as f64
            };
            DepartmentStatistics {
                department_id,
                waiting,
                served: (mix(department_id as u64) >> 58) as u32 + 10,
                average_wait_minutes,
            }
        })
        .collect();

    let total_waiting = departments.iter().map(|d| d.waiting).sum();
    let total_served = departments.iter().map(|d| d.served).sum();
    let average_wait_minutes = if departments.is_empty() {
        0.0
    } else {
        departments.iter().map(|d| d.average_wait_minutes).sum::<f64>() / departments.len() as f64
    };

    QueueStatistics {
        total_waiting,
        total_served,
        average_wait_minutes,
        departments,
    }
}
