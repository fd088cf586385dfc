// SPDX-License-Identifier: PMPL-1.0-or-later

use billstore_engine::model::SharedGroup;

use crate::legacy::V1SharedGroup;

pub fn transform_shared_group(legacy: V1SharedGroup) -> SharedGroup {
    SharedGroup {
        id: legacy.id,
        account_parameters: legacy.account_parameters,
        member_ids: legacy.member_ids.into_iter().collect(),
    }
}
